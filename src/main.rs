use std::{env, path::PathBuf};

use anyhow::Result;
use fixed_width_loader::{
    Error, LoadResult, Loader, LoaderConfig, SqliteStore, load_specifications, setup_logging,
    to_summary_records,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let config = LoaderConfig::from_file(&get_config_path()?)?;
    let mut store = SqliteStore::open(&config.database)?;
    let (specs, spec_errors) = load_specifications(&config.specs_dir)?;
    info!(
        loaded = specs.len(),
        rejected = spec_errors.len(),
        "specifications loaded"
    );

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let mut wtr = csv::Writer::from_writer(get_writer());
    for spec in &specs {
        if cancel.is_cancelled() {
            break;
        }
        let results = Loader::new(&mut store, spec, config.load_options())
            .with_cancellation(cancel.clone())
            .load_files()
            .await?;

        for (file, result) in &results {
            handle_load_result(file, result);
        }
        for record in to_summary_records(&results) {
            wtr.serialize(&record)?;
        }
    }
    wtr.flush()?;

    Ok(())
}

fn get_config_path() -> Result<PathBuf> {
    let path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Usage: fixed-width-loader <config.json>"))?;
    Ok(PathBuf::from(path))
}

fn get_writer() -> impl std::io::Write {
    std::io::stdout()
}

// Just logs the errors; the summary on stdout carries the counts
fn handle_load_result(file: &str, result: &Result<LoadResult, Error>) {
    match result {
        Ok(loaded) => {
            for error in &loaded.errors {
                warn!(file, "{error}");
            }
        }
        Err(error) => warn!(file, "{error}"),
    }
}

async fn cancel_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!("cannot listen for SIGTERM: {e}");
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!(signal = "SIGINT", "signal received, cancelling"),
            _ = sigterm.recv() => info!(signal = "SIGTERM", "signal received, cancelling"),
        }
    }
    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(signal = "ctrl-c", "signal received, cancelling");
        }
    }
    cancel.cancel();
}
