use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use review_import_sources::csv_file::field_for_column;
use review_import_sources::{CsvReader, ReviewSource};
use std::path::Path;

/// Structural check only; nothing is copied and no session is opened
pub async fn run_validate(file: &Path, output: &Output) -> Result<()> {
    let mut reader = CsvReader::new(file);
    let report = reader.validate();
    output.data("validation", &report);

    if !report.valid {
        for message in &report.errors {
            output.error(message);
        }
        return Err(eyre!("{} is not importable", file.display()));
    }

    let headers = reader.headers()?;
    let ignored: Vec<&str> = headers
        .iter()
        .map(String::as_str)
        .filter(|h| field_for_column(h).is_none())
        .collect();

    output.success(format!(
        "{} is valid: {} data rows",
        file.display(),
        reader.total_rows()
    ));
    if !ignored.is_empty() {
        output.warn(format!("These columns will be ignored: {}", ignored.join(", ")));
    }
    Ok(())
}
