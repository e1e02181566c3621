//! Module defining the relational store the loader writes into.
//!
//! The loader only relies on the [`Store`] and [`StoreTransaction`] traits. [`SqliteStore`] is
//! the backend shipped with the crate.

use chrono::NaiveDate;

use crate::domain::{ParsedRecord, Specification};
use crate::error::Error;

mod sqlite;

pub use sqlite::{SqliteStore, SqliteTransaction};


/// Name of the column holding the report date of every row
pub const REPORT_DATE_COLUMN: &str = "_reportDate";

pub trait Store {
    type Transaction<'a>: StoreTransaction
    where
        Self: 'a;

    /// Creates the table of `spec` in `schema` if it does not exist yet, or verifies that the
    /// existing table has the report date column and every column of `spec` with a matching type.
    ///
    /// Fails with [`Error::Configuration`] if an existing table does not match.
    fn ensure_table(&mut self, schema: &str, spec: &Specification) -> Result<(), Error>;

    /// Opens a transaction on the table of `spec`.
    fn begin(&mut self, schema: &str, spec: &Specification) -> Result<Self::Transaction<'_>, Error>;
}

/// An open transaction on the table of one specification.
///
/// Dropping a transaction without committing it must roll it back.
pub trait StoreTransaction {
    /// Deletes every row of `report_date`, returning the number of deleted rows
    fn delete_report_date(&mut self, report_date: NaiveDate) -> Result<usize, Error>;

    /// Inserts all records as one bulk operation, returning the number of inserted rows
    fn insert_records(&mut self, records: &[ParsedRecord<'_>]) -> Result<usize, Error>;

    fn commit(self) -> Result<(), Error>;

    fn rollback(self) -> Result<(), Error>;
}
