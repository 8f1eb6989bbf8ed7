use super::Workspace;
use crate::output::Output;
use color_eyre::Result;
use serde_json::json;
use std::fs;
use std::path::Path;

pub async fn run_clear(workspace: &Workspace, all: bool, output: &Output) -> Result<()> {
    if all {
        let paths = &workspace.paths;
        let sessions = clear_dir(&paths.session_dir())?;
        let uploads = clear_dir(&paths.upload_dir())?;
        output.success(format!(
            "Removed {} session records and {} upload files",
            sessions, uploads
        ));
        output.data("cleared", &json!({ "sessions": sessions, "uploads": uploads }));
        return Ok(());
    }

    let coordinator = workspace.coordinator()?;
    let (sessions, uploads) = coordinator.clear_expired()?;
    if sessions == 0 && uploads == 0 {
        output.info("Nothing has expired");
    } else {
        output.success(format!(
            "Removed {} expired session records and {} stale upload files",
            sessions, uploads
        ));
    }
    output.data("cleared", &json!({ "sessions": sessions, "uploads": uploads }));
    Ok(())
}

/// Delete every file in `dir`, returning how many were removed
fn clear_dir(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            fs::remove_file(&path)
                .map_err(|e| color_eyre::eyre::eyre!("Failed to remove {}: {}", path.display(), e))?;
            removed += 1;
        }
    }
    Ok(removed)
}
