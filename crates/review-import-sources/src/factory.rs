use crate::csv_file::CsvReader;
use crate::error::SourceError;
use crate::traits::ReviewSource;
use std::path::Path;

/// Pick the source implementation for a stored upload by its extension
pub fn source_for_path(path: &Path) -> Result<Box<dyn ReviewSource>, SourceError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(Box::new(CsvReader::new(path))),
        other => Err(SourceError::UnsupportedFormat(other.to_string())),
    }
}
