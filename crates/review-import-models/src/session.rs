use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One uploaded file that passed structural validation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadSession {
    pub upload_id: String,
    pub file_path: PathBuf,
    pub total_rows: usize,
    pub headers: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// A row that could not be imported
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowError {
    pub row_number: usize,
    pub code: String,
    pub message: String,
}

/// Running totals for an upload, updated after every batch
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportProgress {
    pub processed: usize,
    pub success: usize,
    pub updated: usize,
    #[serde(default)]
    pub errors: Vec<RowError>,
}

impl ImportProgress {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}
