//! Integration tests running the actual crate binary against the fixtures in `tests/data/`: Test the full E2E path.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const EXPECTED_SUMMARY: &str = "\
file,report_date,lines_processed,lines_saved,errors,outcome
testformat1_2015-06-28.txt,2015-06-28,7,4,2,committed
";

#[test]
fn loads_fixture_directory() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = write_config(&dir, &fixture_path("data"));

    let output = run_binary(&config);

    let stdout = String::from_utf8(output.stdout).expect("binary output was not valid UTF-8");
    assert_eq!(stdout, EXPECTED_SUMMARY);

    let conn = rusqlite::Connection::open(dir.path().join("loader.db")).expect("failed to open database");
    let mut stmt = conn
        .prepare("SELECT name, valid, count FROM testformat1 WHERE _reportDate = '2015-06-28' ORDER BY id")
        .expect("failed to prepare row query");
    let rows: Vec<(String, bool, Option<i64>)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .expect("failed to query rows")
        .collect::<rusqlite::Result<_>>()
        .expect("failed to read loaded rows");
    assert_eq!(
        rows,
        [
            ("Foonyor".to_string(), true, Some(1)),
            ("Barzane".to_string(), false, Some(10)),
            ("Quuxy".to_string(), true, Some(103)),
            ("Shorty".to_string(), true, None),
        ]
    );
}

#[test]
fn rerun_replaces_instead_of_appending() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = write_config(&dir, &fixture_path("data"));

    run_binary(&config);
    let output = run_binary(&config);

    let stdout = String::from_utf8(output.stdout).expect("binary output was not valid UTF-8");
    assert_eq!(stdout, EXPECTED_SUMMARY);
    let conn = rusqlite::Connection::open(dir.path().join("loader.db")).expect("failed to open database");
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM testformat1", [], |row| row.get(0))
        .expect("failed to count rows");
    assert_eq!(count, 4);
}

#[test]
fn missing_config_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_fixed-width-loader"))
        .arg("/nonexistent/loader.json")
        .output()
        .expect("failed to execute binary");

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

fn run_binary(config: &Path) -> Output {
    let output = Command::new(env!("CARGO_BIN_EXE_fixed-width-loader"))
        .arg(config)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to execute binary");

    assert!(
        output.status.success(),
        "binary exited with non-zero status.\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

/// Writes a config into `dir` pointing at the fixture specifications, a database inside `dir`
/// and `data_dir`.
fn write_config(dir: &TempDir, data_dir: &Path) -> PathBuf {
    let config = serde_json::json!({
        "database": dir.path().join("loader.db"),
        "specs_dir": fixture_path("specs"),
        "data_dir": data_dir,
    });
    let path = dir.path().join("loader.json");
    std::fs::write(&path, config.to_string()).expect("failed to write config");
    path
}

/// Returns the absolute path to a fixture in `tests/data/`.
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}
