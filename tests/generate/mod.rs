//! This module contains scripts which are used to generate the inputs used for other tests or benchmarking. They are implemented as ignored tests to enable running them comfortably

use std::path::PathBuf;


fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
}

fn write_text(content: &str, path: &std::path::Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("failed to create {}: {e}", parent.display()));
    }
    std::fs::write(path, content)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    eprintln!("  wrote {}", path.display());
}

/// Builds `count` lines of the `name(10) valid(1) count(3)` format.
///
/// Every `reject_every`-th line carries an invalid boolean, every 50th is blank and every 7th
/// stops after the boolean, leaving its count NULL. The content depends on `seed` only.
fn build_lines(count: usize, reject_every: usize, seed: u64) -> String {
    let mut state = seed;
    let mut out = String::with_capacity(count * 15);
    for i in 1..=count {
        // xorshift keeps the fixture stable across platforms
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;

        if i % 50 == 0 {
            out.push('\n');
            continue;
        }
        let name = format!("N{:x}", state % 0xff_ffff);
        let valid = if i % reject_every == 0 { '2' } else if state % 2 == 0 { '0' } else { '1' };
        if i % 7 == 0 {
            out.push_str(&format!("{name:<10}{valid}\n"));
        } else {
            out.push_str(&format!("{name:<10}{valid}{:>3}\n", state % 1000));
        }
    }
    out
}
