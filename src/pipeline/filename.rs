//! File names of data files: `<specification key>_<YYYY-MM-DD>.<extension>`

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{Error, configuration_error};

/// Matches the data file names of one specification
pub(crate) struct FilenamePattern {
    key: String,
    suffix: Regex,
}

impl FilenamePattern {
    pub(crate) fn new(key: &str, extension: &str) -> Self {
        let suffix = Regex::new(&format!(
            r"(?i)^_([0-9]{{4}}-[0-9]{{2}}-[0-9]{{2}})\.{}$",
            regex::escape(extension)
        ))
        .expect("escaped extension forms a valid regex");

        Self {
            key: key.to_string(),
            suffix,
        }
    }

    /// Whether `filename` belongs to this specification. Only the shape is checked, not the date.
    ///
    /// The key must match exactly: `abc_2015-06-28.txt` does not belong to the specification `ab`.
    pub(crate) fn matches(&self, filename: &str) -> bool {
        self.date_text(filename).is_some()
    }

    /// Extracts the report date from `filename`
    pub(crate) fn report_date(&self, filename: &str) -> Result<NaiveDate, Error> {
        let Some(text) = self.date_text(filename) else {
            return Err(configuration_error(format!(
                "file name {filename} does not match {}_YYYY-MM-DD",
                self.key
            )));
        };
        NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| {
            configuration_error(format!("invalid date in file name {filename}: {e}"))
        })
    }

    fn date_text<'f>(&self, filename: &'f str) -> Option<&'f str> {
        let rest = filename.strip_prefix(self.key.as_str())?;
        let captures = self.suffix.captures(rest)?;
        captures.get(1).map(|m| m.as_str())
    }
}
