use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Error, LineError};

/// Typed value of a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Boolean(bool),
    /// `None` when the field is blank
    Integer(Option<i64>),
}

/// A successfully parsed line: the field values in declared column order, tagged with the report date.
///
/// Columns a short line does not reach are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord<'s> {
    report_date: NaiveDate,
    fields: Vec<(&'s str, Value)>,
}

impl<'s> ParsedRecord<'s> {
    pub(crate) fn new(report_date: NaiveDate, fields: Vec<(&'s str, Value)>) -> Self {
        Self {
            report_date,
            fields,
        }
    }

    pub fn report_date(&self) -> NaiveDate {
        self.report_date
    }

    pub fn fields(&self) -> &[(&'s str, Value)] {
        &self.fields
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }
}

/// Terminal state of the transaction of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    Committed,
    RolledBack,
}

/// Summary of loading one file. Created fresh for every load, never persisted.
#[derive(Debug)]
pub struct LoadResult {
    pub report_date: NaiveDate,
    pub lines_processed: usize,
    pub lines_saved: usize,
    /// Line errors in line order, followed by the fatal error that aborted the load, if any
    pub errors: Vec<Error>,
    pub outcome: LoadOutcome,
}

impl LoadResult {
    pub(crate) fn new(report_date: NaiveDate) -> Self {
        Self {
            report_date,
            lines_processed: 0,
            lines_saved: 0,
            errors: Vec::new(),
            outcome: LoadOutcome::RolledBack,
        }
    }

    pub fn line_errors(&self) -> impl Iterator<Item = &LineError> {
        self.errors.iter().filter_map(|e| match e {
            Error::Line(line_error) => Some(line_error),
            _ => None,
        })
    }

    pub fn has_line_errors(&self) -> bool {
        self.line_errors().next().is_some()
    }

    pub fn is_committed(&self) -> bool {
        self.outcome == LoadOutcome::Committed
    }
}
