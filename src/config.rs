//! Module for the configuration of the loader binary and of a single [`Loader`](crate::Loader)

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, configuration_error};

const DEFAULT_CHUNK_SIZE: NonZeroUsize = NonZeroUsize::new(10_000).expect("non-zero");

/// Options controlling how the files of one specification are loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Directory the data files are read from
    pub base_dir: PathBuf,
    /// Schema (SQLite database name) holding the destination tables
    pub schema: String,
    /// Number of lines parsed and inserted together
    pub chunk_size: NonZeroUsize,
    /// Commit the valid lines of a file even if some lines were rejected
    pub skip_error_lines: bool,
    /// Extension of the data files, matched case-insensitively
    pub extension: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("data"),
            schema: default_schema(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            skip_error_lines: true,
            extension: default_extension(),
        }
    }
}

/// Configuration file of the binary, e.g.
///
/// ```json
/// { "database": "loader.db", "specs_dir": "specs", "data_dir": "data", "chunk_size": 5000 }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    pub database: PathBuf,
    pub specs_dir: PathBuf,
    pub data_dir: PathBuf,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: NonZeroUsize,
    #[serde(default = "default_skip_error_lines")]
    pub skip_error_lines: bool,
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl LoaderConfig {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            configuration_error(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, Error> {
        serde_json::from_str(raw).map_err(|e| configuration_error(format!("invalid config: {e}")))
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            base_dir: self.data_dir.clone(),
            schema: self.schema.clone(),
            chunk_size: self.chunk_size,
            skip_error_lines: self.skip_error_lines,
            extension: self.extension.clone(),
        }
    }
}

fn default_schema() -> String {
    "main".to_string()
}

fn default_chunk_size() -> NonZeroUsize {
    DEFAULT_CHUNK_SIZE
}

fn default_skip_error_lines() -> bool {
    true
}

fn default_extension() -> String {
    "txt".to_string()
}
