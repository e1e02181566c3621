//! Module defining the loading of specifications from their CSV definition files.
//!
//! A specification file `<key>.csv` lists one column per row:
//!
//! ```text
//! column name,width,datatype
//! name,10,TEXT
//! valid,1,BOOLEAN
//! count,3,INTEGER
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{Column, DataType, Specification};
use crate::error::{Error, configuration_error, specification_error};


/// Parses the CSV definition provided by the reader into a specification named `key`
pub fn parse_specification(key: &str, reader: impl Read) -> Result<Specification, Error> {
    let csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = csv_reader
        .into_deserialize::<RawColumn>()
        .map(|result| {
            let raw = result?;
            raw.into_column(key)
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Specification::new(key, columns)
}

/// Loads the specification from the file at `path`; its key is the file name without extension
pub fn load_specification(path: &Path) -> Result<Specification, Error> {
    let key = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| configuration_error(format!("invalid file name: {}", path.display())))?;
    let file = std::fs::File::open(path)
        .map_err(|e| configuration_error(format!("cannot open {}: {e}", path.display())))?;

    let spec = parse_specification(key, file)?;
    debug!(key, columns = spec.columns().len(), "loaded specification");
    Ok(spec)
}

/// Loads every `*.csv` specification in `dir`, sorted by file name.
///
/// A broken specification file does not prevent the others from loading: the successfully
/// loaded specifications and the errors are returned separately.
pub fn load_specifications(dir: &Path) -> Result<(Vec<Specification>, Vec<Error>), Error> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| configuration_error(format!("cannot list {}: {e}", dir.display())))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    paths.sort();

    let mut specs = Vec::with_capacity(paths.len());
    let mut errors = Vec::new();
    for path in paths {
        match load_specification(&path) {
            Ok(spec) => specs.push(spec),
            Err(e) => {
                warn!(path = %path.display(), "skipping specification: {e}");
                errors.push(e);
            }
        }
    }

    Ok((specs, errors))
}

// Intermediate type mirroring the CSV columns
#[derive(Deserialize)]
struct RawColumn {
    #[serde(rename = "column name")]
    column_name: String,
    width: String,
    #[serde(rename = "datatype")]
    data_type: String,
}

impl RawColumn {
    fn into_column(self, key: &str) -> Result<Column, Error> {
        let RawColumn {
            column_name,
            width,
            data_type,
        } = self;

        let Ok(width) = width.parse::<usize>() else {
            return Err(specification_error(key, column_name, "invalid width"));
        };
        let Ok(data_type) = data_type.parse::<DataType>() else {
            return Err(specification_error(key, column_name, "invalid data type"));
        };

        Ok(Column::new(column_name, width, data_type))
    }
}
