use std::collections::BTreeMap;

use serde::Serialize;

use crate::Error;
use crate::domain::{LoadOutcome, LoadResult};


/// Converts the results of a batch into one summary row per file, in file name order.
pub fn to_summary_records(
    results: &BTreeMap<String, Result<LoadResult, Error>>,
) -> impl Iterator<Item = LoadSummary> + '_ {
    results
        .iter()
        .map(|(file, result)| LoadSummary::new(file, result))
}

/// Public DTO summarizing the load of one file, serializable as a CSV row.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub file: String,
    /// Empty when the file failed before its report date was known to be valid
    pub report_date: Option<String>,
    pub lines_processed: usize,
    pub lines_saved: usize,
    pub errors: usize,
    pub outcome: SummaryOutcome,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SummaryOutcome {
    Committed,
    RolledBack,
    /// The file was rejected before any transaction was opened
    Failed,
}

impl LoadSummary {
    fn new(file: &str, result: &Result<LoadResult, Error>) -> Self {
        match result {
            Ok(loaded) => Self {
                file: file.to_string(),
                report_date: Some(loaded.report_date.format("%Y-%m-%d").to_string()),
                lines_processed: loaded.lines_processed,
                lines_saved: loaded.lines_saved,
                errors: loaded.errors.len(),
                outcome: match loaded.outcome {
                    LoadOutcome::Committed => SummaryOutcome::Committed,
                    LoadOutcome::RolledBack => SummaryOutcome::RolledBack,
                },
            },
            Err(_) => Self {
                file: file.to_string(),
                report_date: None,
                lines_processed: 0,
                lines_saved: 0,
                errors: 1,
                outcome: SummaryOutcome::Failed,
            },
        }
    }
}
