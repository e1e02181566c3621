//! Module for the types describing fixed-width formats and the results of loading them.

mod record;
mod specification;

pub use record::{LoadOutcome, LoadResult, ParsedRecord, Value};
pub use specification::{Column, DataType, Specification};
