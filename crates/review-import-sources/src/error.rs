use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Unable to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} has no header row")]
    Empty(PathBuf),

    #[error("Unsupported review source: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}
