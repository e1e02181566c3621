//! Module for the loading pipeline: one file, one transaction, all rows of its report date replaced.
//!
//! A file goes through the following phases:
//!
//! 1. the report date is taken from the file name, the file and the destination table are checked,
//! 2. a transaction is opened and the previous rows of the report date are deleted,
//! 3. the file is streamed chunk by chunk, every chunk parsed and bulk-inserted,
//! 4. the transaction is committed, or rolled back if the load failed or (in strict mode)
//!    any line was rejected.
//!
//! Only the first phase can fail the whole call. Failures of the later phases are recorded
//! in the [`LoadResult`] of the file.

mod filename;

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::Path;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LoadOptions;
use crate::domain::{LoadOutcome, LoadResult, Specification};
use crate::error::{Error, configuration_error};
use crate::parse::parse_chunk;
use crate::source::{ChunkReader, LineSource};
use crate::store::{Store, StoreTransaction};

use filename::FilenamePattern;

/// Loads the data files of one specification into a store.
///
/// The loader borrows the store exclusively, so two loads through the same store can never
/// interleave their delete and insert statements.
pub struct Loader<'a, S: Store> {
    store: &'a mut S,
    spec: &'a Specification,
    options: LoadOptions,
    pattern: FilenamePattern,
    cancel: CancellationToken,
}

impl<'a, S: Store> Loader<'a, S> {
    pub fn new(store: &'a mut S, spec: &'a Specification, options: LoadOptions) -> Self {
        let pattern = FilenamePattern::new(spec.key(), &options.extension);
        Self {
            store,
            spec,
            options,
            pattern,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `cancel` to abort loads. Cancellation is observed between chunks and rolls the
    /// current file back.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Loads every file of the base directory named `<key>_<YYYY-MM-DD>.<extension>`, one after
    /// the other in file name order.
    ///
    /// A file that cannot be loaded does not stop the batch; its error is kept in the returned map.
    /// Fails only if the base directory cannot be listed.
    pub async fn load_files(&mut self) -> Result<BTreeMap<String, Result<LoadResult, Error>>, Error> {
        let filenames = self.list_files().await?;
        info!(spec = self.spec.key(), files = filenames.len(), "loading files");

        let mut results = BTreeMap::new();
        for filename in filenames {
            let result = self.load_file(&filename).await;
            if let Err(e) = &result {
                warn!(file = %filename, "file not loaded: {e}");
            }
            results.insert(filename, result);
        }
        Ok(results)
    }

    /// Loads `filename` from the base directory, replacing every row of its report date.
    ///
    /// Fails with [`Error::Configuration`] if the name does not carry a valid report date, the
    /// file does not exist or cannot be opened, or the destination table does not match the
    /// specification.
    pub async fn load_file(&mut self, filename: &str) -> Result<LoadResult, Error> {
        let report_date = self.pattern.report_date(filename)?;
        let path = self.options.base_dir.join(filename);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                return Err(configuration_error(format!(
                    "file not found: {}",
                    path.display()
                )));
            }
        }
        self.store.ensure_table(&self.options.schema, self.spec)?;

        let source = open_source(&path, self.options.chunk_size).await?;
        let mut chunks = ChunkReader::new(source, self.options.chunk_size);
        let mut result = LoadResult::new(report_date);

        match self.store.begin(&self.options.schema, self.spec) {
            Ok(mut tx) => {
                let streamed = stream_file(
                    &mut tx,
                    &mut chunks,
                    self.spec,
                    report_date,
                    &self.cancel,
                    &mut result,
                )
                .await;
                finish(tx, streamed, self.options.skip_error_lines, &mut result);
            }
            Err(e) => result.errors.push(e),
        }

        info!(
            file = filename,
            %report_date,
            processed = result.lines_processed,
            saved = result.lines_saved,
            errors = result.errors.len(),
            outcome = ?result.outcome,
            peak_buffered = chunks.source().peak_buffered(),
            "file loaded"
        );
        Ok(result)
    }

    async fn list_files(&self) -> Result<Vec<String>, Error> {
        let dir = &self.options.base_dir;
        let list_error = |e: std::io::Error| {
            configuration_error(format!("cannot list {}: {e}", dir.display()))
        };

        let mut entries = tokio::fs::read_dir(dir).await.map_err(list_error)?;
        let mut filenames = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if self.pattern.matches(&name) {
                filenames.push(name);
            }
        }
        filenames.sort();
        Ok(filenames)
    }
}

/// Opens the data file; a file that exists but cannot be read is a configuration problem
async fn open_source(path: &Path, capacity: NonZeroUsize) -> Result<LineSource, Error> {
    LineSource::open(path, capacity)
        .await
        .map_err(|e| configuration_error(format!("cannot open {}: {e}", path.display())))
}

/// Deletes the previous rows of the report date, then parses and inserts the file chunk by
/// chunk. Stops at the first storage, stream or cancellation error.
async fn stream_file<T: StoreTransaction>(
    tx: &mut T,
    chunks: &mut ChunkReader,
    spec: &Specification,
    report_date: NaiveDate,
    cancel: &CancellationToken,
    result: &mut LoadResult,
) -> Result<(), Error> {
    let deleted = tx.delete_report_date(report_date)?;
    debug!(deleted, "deleted previous rows of the report date");

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let Some(chunk) = chunks.next_chunk().await? else {
            return Ok(());
        };

        let parsed = parse_chunk(
            &chunk.lines,
            chunk.first_line_number,
            spec.columns(),
            report_date,
        );
        let saved = if parsed.records.is_empty() {
            0
        } else {
            tx.insert_records(&parsed.records)?
        };

        result.lines_processed += chunk.lines.len();
        result.lines_saved += saved;
        debug!(
            first_line = chunk.first_line_number,
            lines = chunk.lines.len(),
            saved,
            errors = parsed.errors.len(),
            total_saved = result.lines_saved,
            "chunk loaded"
        );
        result.errors.extend(parsed.errors.into_iter().map(Error::Line));
    }
}

/// Commits or rolls back the transaction of a file and records the outcome
fn finish<T: StoreTransaction>(
    tx: T,
    streamed: Result<(), Error>,
    skip_error_lines: bool,
    result: &mut LoadResult,
) {
    let commit = match streamed {
        Ok(()) => skip_error_lines || !result.has_line_errors(),
        Err(e) => {
            warn!("load aborted: {e}");
            result.errors.push(e);
            false
        }
    };

    if commit {
        match tx.commit() {
            Ok(()) => result.outcome = LoadOutcome::Committed,
            Err(e) => {
                warn!("commit failed: {e}");
                result.lines_saved = 0;
                result.errors.push(e);
            }
        }
    } else {
        result.lines_saved = 0;
        if let Err(e) = tx.rollback() {
            warn!("rollback failed: {e}");
            result.errors.push(e);
        }
    }
}
