mod config;
mod domain;
mod error;
mod output;
mod parse;
mod pipeline;
mod source;
mod spec;
mod store;
mod telemetry;

pub use config::{LoadOptions, LoaderConfig};
pub use domain::{Column, DataType, LoadOutcome, LoadResult, ParsedRecord, Specification, Value};
pub use error::{Error, LineError};
pub use output::{LoadSummary, SummaryOutcome, to_summary_records};
pub use parse::{Fields, parse_line};
pub use pipeline::Loader;
pub use source::{Chunk, ChunkReader, LineSource};
pub use spec::{load_specification, load_specifications, parse_specification};
pub use store::{REPORT_DATE_COLUMN, SqliteStore, SqliteTransaction, Store, StoreTransaction};
pub use telemetry::setup_logging;

/// Loads dated fixed-width files into a relational store.
///
/// Every data file is named `<specification key>_<YYYY-MM-DD>.<extension>`. Loading a file
/// replaces all rows of its report date inside a single transaction, so a reload either fully
/// replaces the previous data of that date or leaves it untouched. Files are streamed in chunks;
/// only one chunk is held in memory at a time.
///
/// # Error handling
///
/// Lines failing validation are reported in [`LoadResult::errors`] as [`Error::Line`]. With
/// [`LoadOptions::skip_error_lines`] (the default) the remaining lines are still committed;
/// otherwise a single rejected line rolls the whole file back.
///
/// Use a [`Loader`] directly to load single files or to make loads cancellable.
///
/// # Example
///
/// ```no_run
/// use fixed_width_loader::{Column, DataType, LoadOptions, Specification, SqliteStore, load_directory};
///
/// # async fn run() -> Result<(), fixed_width_loader::Error> {
/// let spec = Specification::new(
///     "testformat1",
///     vec![
///         Column::new("name", 10, DataType::Text),
///         Column::new("valid", 1, DataType::Boolean),
///         Column::new("count", 3, DataType::Integer),
///     ],
/// )?;
/// let mut store = SqliteStore::open(std::path::Path::new("loader.db"))?;
///
/// let options = LoadOptions::default();
///
/// for (file, result) in load_directory(&mut store, &spec, options).await? {
///     match result {
///         Ok(loaded) => {
///             for error in loaded.line_errors() {
///                 eprintln!("{file}: rejected {error}");
///             }
///         }
///         Err(e) => eprintln!("{file}: not loaded: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn load_directory<S: Store>(
    store: &mut S,
    spec: &Specification,
    options: LoadOptions,
) -> Result<std::collections::BTreeMap<String, Result<LoadResult, Error>>, Error> {
    Loader::new(store, spec, options).load_files().await
}
