use super::Workspace;
use crate::output::Output;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use review_import_core::SessionState;

pub async fn run_status(workspace: &Workspace, upload_id: &str, output: &Output) -> Result<()> {
    let coordinator = workspace.coordinator()?;
    let status = coordinator.status(upload_id)?;

    let state = match status.state {
        SessionState::Validated => "Validated, not started".to_string(),
        SessionState::Importing { offset } => format!("Importing, next offset {}", offset),
    };

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Upload").fg(Color::Cyan).add_attribute(Attribute::Bold),
        Cell::new(&status.session.upload_id),
    ]);
    table.add_row(vec![Cell::new("State"), Cell::new(state)]);
    table.add_row(vec![Cell::new("File"), Cell::new(status.session.file_path.display())]);
    table.add_row(vec![
        Cell::new("Uploaded"),
        Cell::new(status.session.uploaded_at.to_rfc3339()),
    ]);
    table.add_row(vec![
        Cell::new("Processed"),
        Cell::new(format!("{} of {} rows", status.progress.processed, status.session.total_rows)),
    ]);
    table.add_row(vec![Cell::new("Created"), Cell::new(status.progress.success)]);
    table.add_row(vec![Cell::new("Updated"), Cell::new(status.progress.updated)]);
    table.add_row(vec![Cell::new("Errors"), Cell::new(status.progress.error_count())]);
    output.table(table);

    output.data("status", &status);
    Ok(())
}
