use crate::output::Output;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Table};
use review_import_sources::{sample_csv, FIELD_DEFINITIONS};
use serde_json::json;
use std::path::PathBuf;

pub async fn run_template(write: Option<PathBuf>, output: &Output) -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("Required").add_attribute(Attribute::Bold),
        Cell::new("Description").add_attribute(Attribute::Bold),
    ]);
    for def in FIELD_DEFINITIONS.iter() {
        table.add_row(vec![
            Cell::new(def.column),
            Cell::new(if def.required { "yes" } else { "no" }),
            Cell::new(def.description),
        ]);
    }
    output.table(table);

    let fields: Vec<_> = FIELD_DEFINITIONS
        .iter()
        .map(|def| json!({ "column": def.column, "field": def.field, "required": def.required, "description": def.description }))
        .collect();
    output.data("fields", &fields);

    match write {
        Some(path) => {
            std::fs::write(&path, sample_csv())
                .map_err(|e| color_eyre::eyre::eyre!("Failed to write {}: {}", path.display(), e))?;
            output.success(format!("Sample CSV written to {}", path.display()));
        }
        None => {
            output.info("");
            output.raw(sample_csv());
        }
    }
    Ok(())
}
