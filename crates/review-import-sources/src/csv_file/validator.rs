use super::fields::REQUIRED_COLUMNS;
use super::reader::CsvReader;
use crate::traits::ValidationReport;
use tracing::{debug, warn};

/// Check that a CSV file can be imported at all.
///
/// Every problem found is reported, not just the first one.
pub fn validate(reader: &mut CsvReader) -> ValidationReport {
    let mut report = ValidationReport {
        valid: true,
        errors: Vec::new(),
    };

    if reader.cached_headers().is_empty() {
        if let Err(e) = reader.parse_headers() {
            warn!(path = %reader.path().display(), error = %e, "CSV headers could not be parsed");
            report.valid = false;
            report.errors.push("Unable to read CSV file.".to_string());
            return report;
        }
    }

    let missing_columns: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !reader.cached_headers().iter().any(|h| h == *column))
        .copied()
        .collect();

    if !missing_columns.is_empty() {
        report.valid = false;
        report
            .errors
            .push(format!("Missing required columns: {}", missing_columns.join(", ")));
    }

    if reader.total_row_count() == 0 {
        report.valid = false;
        report.errors.push("CSV file contains no data rows.".to_string());
    }

    debug!(valid = report.valid, errors = report.errors.len(), "Validated CSV structure");
    report
}
