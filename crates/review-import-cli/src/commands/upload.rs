use super::Workspace;
use crate::output::Output;
use color_eyre::Result;
use review_import_core::UploadReceipt;
use std::path::Path;

pub async fn run_upload(workspace: &Workspace, file: &Path, output: &Output) -> Result<()> {
    tracing::debug!("Upload command started for {}", file.display());

    let coordinator = workspace.coordinator()?;
    let receipt = coordinator
        .upload(file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    print_receipt(&receipt, output);
    output.info(format!(
        "Next: review-import run --upload-id {}",
        receipt.upload_id
    ));
    Ok(())
}

pub fn print_receipt(receipt: &UploadReceipt, output: &Output) {
    output.success("File uploaded successfully.");
    output.info(format!("Upload id: {}", receipt.upload_id));
    output.info(format!("Rows:      {}", receipt.total_rows));
    output.info(format!("Columns:   {}", receipt.headers.join(", ")));
    output.data("upload", receipt);
}
