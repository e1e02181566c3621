use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::types::{Null, ToSqlOutput};
use rusqlite::{Connection, ToSql, Transaction};
use tracing::{debug, info};

use crate::domain::{ParsedRecord, Specification, Value};
use crate::error::{Error, configuration_error};
use crate::store::{REPORT_DATE_COLUMN, Store, StoreTransaction};

/// Store writing into a SQLite database. Schema names are SQLite database names (`main` by default).
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, Error> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // declared column name -> declared type, empty if the table does not exist
    fn table_columns(&self, schema: &str, table: &str) -> Result<HashMap<String, String>, Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1, ?2)")?;
        let columns = stmt
            .query_map([table, schema], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<HashMap<String, String>>>()?;
        Ok(columns)
    }

    fn create_table(&self, schema: &str, spec: &Specification) -> Result<(), Error> {
        let mut definitions = vec![
            format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote("id")),
            format!("{} DATE NOT NULL", quote(REPORT_DATE_COLUMN)),
        ];
        definitions.extend(
            spec.columns()
                .iter()
                .map(|c| format!("{} {}", quote(c.name()), c.data_type())),
        );

        let index = format!("{}_{}_idx", spec.key(), REPORT_DATE_COLUMN);
        let sql = format!(
            "CREATE TABLE {table} ({definitions});\n\
             CREATE INDEX {schema}.{index} ON {key} ({date});",
            table = qualified(schema, spec.key()),
            definitions = definitions.join(", "),
            schema = quote(schema),
            index = quote(&index),
            key = quote(spec.key()),
            date = quote(REPORT_DATE_COLUMN),
        );
        self.conn.execute_batch(&sql)?;
        Ok(())
    }
}

impl Store for SqliteStore {
    type Transaction<'a> = SqliteTransaction<'a>;

    fn ensure_table(&mut self, schema: &str, spec: &Specification) -> Result<(), Error> {
        let existing = self.table_columns(schema, spec.key())?;
        if existing.is_empty() {
            self.create_table(schema, spec)?;
            info!(schema, table = spec.key(), "created table");
            return Ok(());
        }

        let expected = std::iter::once((REPORT_DATE_COLUMN, "DATE")).chain(
            spec.columns()
                .iter()
                .map(|c| (c.name(), c.data_type().as_str())),
        );
        for (name, expected_type) in expected {
            let Some(actual_type) = existing.get(name) else {
                return Err(configuration_error(format!(
                    "existing table {} has no column {name}",
                    spec.key()
                )));
            };
            if !actual_type.eq_ignore_ascii_case(expected_type) {
                return Err(configuration_error(format!(
                    "existing table {}'s column {name} has type {} instead of {}",
                    spec.key(),
                    actual_type.to_lowercase(),
                    expected_type.to_lowercase(),
                )));
            }
        }

        debug!(schema, table = spec.key(), "existing table matches specification");
        Ok(())
    }

    fn begin(&mut self, schema: &str, spec: &Specification) -> Result<SqliteTransaction<'_>, Error> {
        let table = qualified(schema, spec.key());
        let columns: Vec<String> = spec.columns().iter().map(|c| c.name().to_string()).collect();

        let column_list = std::iter::once(REPORT_DATE_COLUMN)
            .chain(columns.iter().map(String::as_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; columns.len() + 1].join(", ");

        Ok(SqliteTransaction {
            delete_sql: format!(
                "DELETE FROM {table} WHERE {} = ?1",
                quote(REPORT_DATE_COLUMN)
            ),
            insert_sql: format!("INSERT INTO {table} ({column_list}) VALUES ({placeholders})"),
            columns,
            tx: self.conn.transaction()?,
        })
    }
}

/// Transaction on one table of a [`SqliteStore`]. Rolls back when dropped unfinished.
pub struct SqliteTransaction<'a> {
    tx: Transaction<'a>,
    columns: Vec<String>,
    delete_sql: String,
    insert_sql: String,
}

impl StoreTransaction for SqliteTransaction<'_> {
    fn delete_report_date(&mut self, report_date: NaiveDate) -> Result<usize, Error> {
        let deleted = self
            .tx
            .execute(&self.delete_sql, [date_text(report_date)])?;
        Ok(deleted)
    }

    fn insert_records(&mut self, records: &[ParsedRecord<'_>]) -> Result<usize, Error> {
        let mut stmt = self.tx.prepare_cached(&self.insert_sql)?;

        for record in records {
            let date = date_text(record.report_date());
            let mut params: Vec<&dyn ToSql> = Vec::with_capacity(self.columns.len() + 1);
            params.push(&date);
            for column in &self.columns {
                // columns a short line does not reach are stored as NULL
                match record.get(column) {
                    Some(value) => params.push(value),
                    None => params.push(&Null),
                }
            }
            stmt.execute(params.as_slice())?;
        }

        Ok(records.len())
    }

    fn commit(self) -> Result<(), Error> {
        self.tx.commit()?;
        Ok(())
    }

    fn rollback(self) -> Result<(), Error> {
        self.tx.rollback()?;
        Ok(())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Text(text) => ToSqlOutput::from(text.as_str()),
            Value::Boolean(flag) => ToSqlOutput::from(*flag),
            Value::Integer(Some(number)) => ToSqlOutput::from(*number),
            Value::Integer(None) => ToSqlOutput::from(Null),
        })
    }
}

fn date_text(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote(schema), quote(table))
}
