//! Module defining the errors which are exposed to the users of the crate

/// A rejected line, described by its first failing column
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line_number} - {column} - {message}")]
pub struct LineError {
    pub line_number: usize,
    pub column: String,
    pub message: String,
}

impl LineError {
    pub(crate) fn new(line_number: usize, column: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            line_number,
            column: column.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad file name or date, missing file, or a destination table that does not match the specification
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A column definition violating the specification invariants
    #[error("invalid specification {key}, column {column}: {message}")]
    Specification {
        key: String,
        column: String,
        message: String,
    },

    /// Malformed specification CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A line that failed column validation
    #[error(transparent)]
    Line(#[from] LineError),

    /// Failure of the relational store (delete, insert, commit, rollback, schema inspection)
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Failure while reading the underlying input
    #[error("stream error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A second line request was issued while another one was still in flight
    #[error("concurrent line requests are not allowed")]
    ConcurrentAccess,

    #[error("load cancelled")]
    Cancelled,
}

pub(crate) fn configuration_error(message: impl Into<String>) -> Error {
    Error::Configuration(message.into())
}

pub(crate) fn specification_error(
    key: impl Into<String>,
    column: impl Into<String>,
    message: impl Into<String>,
) -> Error {
    Error::Specification {
        key: key.into(),
        column: column.into(),
        message: message.into(),
    }
}
