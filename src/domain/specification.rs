use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, specification_error};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[_a-zA-Z][_a-zA-Z0-9]*$").expect("identifier regex is valid"));

/// The type a fixed-width field is parsed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Text,
    Boolean,
    Integer,
}

impl DataType {
    /// Name of the type as declared in specification files and in the destination table
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "TEXT",
            DataType::Boolean => "BOOLEAN",
            DataType::Integer => "INTEGER",
        }
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TEXT" => Ok(DataType::Text),
            "BOOLEAN" => Ok(DataType::Boolean),
            "INTEGER" => Ok(DataType::Integer),
            other => Err(format!("unknown data type: {other}")),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    width: usize,
    data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, width: usize, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            width,
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}

/// A named, ordered column layout identifying one fixed-width file format.
///
/// Columns occupy contiguous byte ranges of a line in declared order, starting at offset 0.
/// A `Specification` can only be built through [`Specification::new`], which enforces the
/// layout invariants, so the loading pipeline never has to validate it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specification {
    key: String,
    columns: Vec<Column>,
}

impl Specification {
    /// Validates the columns and builds the specification.
    ///
    /// Rejects an empty column list, names that are not identifiers, zero widths,
    /// BOOLEAN columns wider than one byte and duplicate names.
    pub fn new(key: impl Into<String>, columns: Vec<Column>) -> Result<Self, Error> {
        let key = key.into();
        if columns.is_empty() {
            return Err(specification_error(&key, "", "no columns found"));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !IDENTIFIER.is_match(&column.name) {
                return Err(specification_error(&key, &column.name, "invalid column name"));
            }
            if column.width == 0 {
                return Err(specification_error(&key, &column.name, "invalid width"));
            }
            if column.data_type == DataType::Boolean && column.width != 1 {
                return Err(specification_error(
                    &key,
                    &column.name,
                    "boolean width must be 1",
                ));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(specification_error(
                    &key,
                    &column.name,
                    "duplicate column name",
                ));
            }
        }

        Ok(Self { key, columns })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Total number of bytes a complete line occupies
    pub fn line_width(&self) -> usize {
        self.columns.iter().map(Column::width).sum()
    }
}
