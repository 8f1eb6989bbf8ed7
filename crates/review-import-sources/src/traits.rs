use crate::error::SourceError;
use review_import_models::ImportRow;
use serde::{Deserialize, Serialize};

/// Outcome of a structural check, run before any row is imported
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// A slice of normalized rows plus how many data lines were read to get it.
///
/// `consumed` counts skipped blank lines too, so adding it to the offset
/// always lands on the next unread line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowBatch {
    pub rows: Vec<ImportRow>,
    pub consumed: usize,
}

impl RowBatch {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True once the source had nothing left to read
    pub fn is_exhausted(&self) -> bool {
        self.consumed == 0
    }
}

/// Anything that can feed review rows to the importer.
///
/// Only CSV is implemented today; the trait is the seam for other exports.
pub trait ReviewSource: Send {
    fn source_name(&self) -> &str;

    /// Column names as they appear in the source
    fn headers(&mut self) -> Result<Vec<String>, SourceError>;

    /// Number of data rows, 0 when the source cannot be read
    fn total_rows(&mut self) -> usize;

    fn validate(&mut self) -> ValidationReport;

    /// Skip `offset` data rows, then return up to `limit` non-empty rows
    fn read_batch(&mut self, offset: usize, limit: usize) -> Result<RowBatch, SourceError>;
}
