//! Module defining the conversion of raw fixed-width lines into typed records.

use chrono::NaiveDate;

use crate::domain::{Column, DataType, ParsedRecord, Value};
use crate::error::LineError;


pub(crate) const NOT_BOOLEAN: &str = "is not 0 or 1";
pub(crate) const NOT_A_NUMBER: &str = "is not a number";

/// Field values of one line in declared column order
pub type Fields<'s> = Vec<(&'s str, Value)>;

/// Outcome of parsing one chunk: the records to persist and one error per rejected line
#[derive(Debug, Default)]
pub(crate) struct ParsedChunk<'s> {
    pub(crate) records: Vec<ParsedRecord<'s>>,
    pub(crate) errors: Vec<LineError>,
}

/// Parses one non-empty line against the columns of a specification.
///
/// Each column consumes the next `width` bytes of the line. Columns starting at or past the
/// end of the line are left out of the result; a column running past the end gets the remainder.
/// The line is either accepted as a whole or rejected at its first failing column.
pub fn parse_line<'s>(
    line: &str,
    columns: &'s [Column],
    line_number: usize,
) -> Result<Fields<'s>, LineError> {
    let bytes = line.as_bytes();
    let mut offset = 0;
    let mut fields = Vec::with_capacity(columns.len());

    for column in columns {
        if offset >= bytes.len() {
            break;
        }
        let end = (offset + column.width()).min(bytes.len());
        let raw = &bytes[offset..end];
        offset += column.width();

        let value = parse_field(raw, column.data_type())
            .map_err(|message| LineError::new(line_number, column.name(), message))?;
        fields.push((column.name(), value));
    }

    Ok(fields)
}

/// Parses every non-blank line of a chunk, tagging the accepted records with `report_date`.
/// Blank lines are skipped without producing a record or an error.
pub(crate) fn parse_chunk<'s>(
    lines: &[String],
    first_line_number: usize,
    columns: &'s [Column],
    report_date: NaiveDate,
) -> ParsedChunk<'s> {
    let mut chunk = ParsedChunk::default();

    for (index, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        match parse_line(line, columns, first_line_number + index) {
            Ok(fields) => chunk.records.push(ParsedRecord::new(report_date, fields)),
            Err(error) => chunk.errors.push(error),
        }
    }

    chunk
}

fn parse_field(raw: &[u8], data_type: DataType) -> Result<Value, &'static str> {
    match data_type {
        // no whitespace tolerance: the field is exactly one byte wide
        DataType::Boolean => match raw {
            b"0" => Ok(Value::Boolean(false)),
            b"1" => Ok(Value::Boolean(true)),
            _ => Err(NOT_BOOLEAN),
        },
        DataType::Integer => parse_integer(raw.trim_ascii()).map(Value::Integer),
        // leading whitespace is part of the value
        DataType::Text => Ok(Value::Text(
            String::from_utf8_lossy(raw).trim_end().to_string(),
        )),
    }
}

fn parse_integer(trimmed: &[u8]) -> Result<Option<i64>, &'static str> {
    if trimmed.is_empty() {
        return Ok(None);
    }

    let digits = trimmed.strip_prefix(b"-").unwrap_or(trimmed);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(NOT_A_NUMBER);
    }

    std::str::from_utf8(trimmed)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .map(Some)
        .ok_or(NOT_A_NUMBER)
}
