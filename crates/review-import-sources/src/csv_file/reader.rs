use super::fields::FIELD_DEFINITIONS;
use super::validator;
use crate::error::SourceError;
use crate::traits::{ReviewSource, RowBatch, ValidationReport};
use csv::{ByteRecord, Reader, ReaderBuilder};
use review_import_models::ImportRow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Reads review rows from a CSV file.
///
/// The file is reopened on every call, so header parsing, counting and
/// batched reads can be mixed freely and no handle outlives a call.
pub struct CsvReader {
    path: PathBuf,
    headers: Vec<String>,
    total_rows: Option<usize>,
}

impl CsvReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            headers: Vec::new(),
            total_rows: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Reader<BufReader<File>>, SourceError> {
        let unreadable = |source| SourceError::Unreadable {
            path: self.path.clone(),
            source,
        };
        let file = File::open(&self.path).map_err(unreadable)?;
        let mut buffered = BufReader::new(file);
        skip_bom(&mut buffered).map_err(unreadable)?;

        Ok(ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(buffered))
    }

    /// Read and trim the header row. Resets the cached row count.
    pub fn parse_headers(&mut self) -> Result<Vec<String>, SourceError> {
        let mut reader = self.open()?;
        let mut record = ByteRecord::new();

        if !reader.read_byte_record(&mut record)? || is_blank(&record) {
            return Err(SourceError::Empty(self.path.clone()));
        }

        let headers: Vec<String> = record
            .iter()
            .map(|cell| String::from_utf8_lossy(cell).trim().to_string())
            .collect();
        debug!(path = %self.path.display(), columns = ?headers, "Parsed CSV headers");

        self.headers = headers.clone();
        self.total_rows = None;
        Ok(headers)
    }

    /// Number of data rows after the header; 0 if the file cannot be read
    pub fn total_row_count(&mut self) -> usize {
        if let Some(count) = self.total_rows {
            return count;
        }

        match self.count_rows() {
            Ok(count) => {
                self.total_rows = Some(count);
                count
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to count CSV rows");
                0
            }
        }
    }

    fn count_rows(&self) -> Result<usize, SourceError> {
        let mut reader = self.open()?;
        let mut record = ByteRecord::new();

        if !reader.read_byte_record(&mut record)? {
            return Ok(0);
        }

        let mut count = 0;
        while reader.read_byte_record(&mut record)? {
            count += 1;
        }
        Ok(count)
    }

    /// Normalized rows starting after `offset` data rows, at most `limit` of them
    pub fn get_batch(&mut self, offset: usize, limit: usize) -> Result<Vec<ImportRow>, SourceError> {
        Ok(self.read_batch_from_file(offset, limit)?.rows)
    }

    fn read_batch_from_file(&mut self, offset: usize, limit: usize) -> Result<RowBatch, SourceError> {
        if self.headers.is_empty() {
            self.parse_headers()?;
        }

        let columns = self.column_indices();
        let mut reader = self.open()?;
        let mut record = ByteRecord::new();
        let mut batch = RowBatch::default();

        // header
        if !reader.read_byte_record(&mut record)? {
            return Ok(batch);
        }

        let mut current_row = 0;
        while current_row < offset {
            if !reader.read_byte_record(&mut record)? {
                return Ok(batch);
            }
            current_row += 1;
        }

        while batch.rows.len() < limit && reader.read_byte_record(&mut record)? {
            batch.consumed += 1;
            current_row += 1;
            let row_number = line_number(&record, current_row);

            if is_blank(&record) {
                debug!(row = row_number, "Skipping empty CSV row");
                continue;
            }

            batch.rows.push(normalize_row(&record, &columns, row_number));
        }

        debug!(
            offset,
            limit,
            rows = batch.rows.len(),
            consumed = batch.consumed,
            "Read CSV batch"
        );
        Ok(batch)
    }

    /// (field name, column index) for every known column present in the header
    fn column_indices(&self) -> Vec<(&'static str, usize)> {
        FIELD_DEFINITIONS
            .iter()
            .filter_map(|def| {
                self.headers
                    .iter()
                    .position(|h| h == def.column)
                    .map(|index| (def.field, index))
            })
            .collect()
    }

    pub(crate) fn cached_headers(&self) -> &[String] {
        &self.headers
    }
}

impl ReviewSource for CsvReader {
    fn source_name(&self) -> &str {
        "csv"
    }

    fn headers(&mut self) -> Result<Vec<String>, SourceError> {
        if self.headers.is_empty() {
            return self.parse_headers();
        }
        Ok(self.headers.clone())
    }

    fn total_rows(&mut self) -> usize {
        self.total_row_count()
    }

    fn validate(&mut self) -> ValidationReport {
        validator::validate(self)
    }

    fn read_batch(&mut self, offset: usize, limit: usize) -> Result<RowBatch, SourceError> {
        self.read_batch_from_file(offset, limit)
    }
}

fn skip_bom<R: BufRead>(reader: &mut R) -> std::io::Result<()> {
    let starts_with_bom = reader.fill_buf()?.starts_with(UTF8_BOM);
    if starts_with_bom {
        reader.consume(UTF8_BOM.len());
    }
    Ok(())
}

/// Line the record starts on. Bare empty lines never become records, so
/// counting records alone would drift after one.
fn line_number(record: &ByteRecord, data_index: usize) -> usize {
    record
        .position()
        .and_then(|pos| usize::try_from(pos.line()).ok())
        // +1 for the header line
        .unwrap_or(data_index + 1)
}

fn is_blank(record: &ByteRecord) -> bool {
    record.is_empty() || (record.len() == 1 && record[0].is_empty())
}

fn normalize_row(record: &ByteRecord, columns: &[(&'static str, usize)], row_number: usize) -> ImportRow {
    let mut row = ImportRow::new(row_number);
    for &(field, index) in columns {
        if let Some(cell) = record.get(index) {
            row.set(field, String::from_utf8_lossy(cell).trim().to_string());
        }
    }
    row
}
