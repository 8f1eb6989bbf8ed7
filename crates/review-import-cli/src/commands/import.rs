use super::run_ui::RunUI;
use super::upload::print_receipt;
use super::Workspace;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Table};
use review_import_core::{BatchCoordinator, BatchReport, CompleteReport, ImportProgressTracker};
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub enum RunStart {
    Upload(PathBuf),
    Resume { upload_id: String, offset: usize },
}

/// One chunk, the way the admin screen issues a single batch request
pub async fn run_import(workspace: &Workspace, upload_id: &str, offset: usize, output: &Output) -> Result<()> {
    let coordinator = Arc::new(workspace.coordinator()?);
    let report = run_chunk(coordinator, upload_id, offset, None).await?;

    match &report {
        BatchReport::InProgress(progress) => {
            output.success(&progress.message);
            output.info(format!(
                "Created: {} | Updated: {} | Errors: {}",
                progress.success, progress.updated, progress.error_count
            ));
            output.info(format!(
                "Next: review-import import {} --offset {}",
                upload_id, progress.processed
            ));
        }
        BatchReport::Complete(complete) => print_completion(complete, output),
    }
    output.data("batch", &report);
    Ok(())
}

/// Upload (or pick up) a file and import every chunk in turn
pub async fn run_full_import(
    workspace: &Workspace,
    start: RunStart,
    chunk_timeout: Option<u64>,
    output: &Output,
) -> Result<()> {
    let coordinator = Arc::new(workspace.coordinator()?);

    let (upload_id, mut offset, total, mut seen) = match start {
        RunStart::Upload(file) => {
            let receipt = coordinator.upload(&file).map_err(|e| eyre!("{}", e))?;
            print_receipt(&receipt, output);
            (receipt.upload_id, 0, receipt.total_rows, Counts::default())
        }
        RunStart::Resume { upload_id, offset } => {
            let status = coordinator.status(&upload_id)?;
            let seen = Counts {
                created: status.progress.success,
                updated: status.progress.updated,
                failed: status.progress.error_count(),
            };
            (upload_id, offset, status.session.total_rows, seen)
        }
    };

    let resumed_failures = seen.failed;

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping after the current chunk");
                interrupted.store(true, Ordering::SeqCst);
            }
        });
    }

    let budget = chunk_timeout.map(Duration::from_secs);
    let ui = RunUI::new(total, offset, output.is_quiet());
    let mut tracker = ImportProgressTracker::new(total, coordinator.context().options.batch_size);
    tracker.log_start(offset);

    loop {
        if interrupted.load(Ordering::SeqCst) {
            ui.abandon("Interrupted");
            output.warn(format!(
                "Import interrupted. Resume with: review-import run --upload-id {} --offset {}",
                upload_id, offset
            ));
            output.data("interrupted", &json!({ "upload_id": upload_id, "next_offset": offset }));
            return Ok(());
        }

        match run_chunk(coordinator.clone(), &upload_id, offset, budget).await? {
            BatchReport::InProgress(progress) => {
                ui.update(progress.processed, progress.total, &progress.message);
                seen = seen.advance(
                    &mut tracker,
                    Counts {
                        created: progress.success,
                        updated: progress.updated,
                        failed: progress.error_count,
                    },
                );
                tracker.log_progress(progress.processed);
                offset = progress.processed;
            }
            BatchReport::Complete(complete) => {
                ui.finish("Done");
                seen.advance(
                    &mut tracker,
                    Counts {
                        created: complete.success,
                        updated: complete.updated,
                        failed: complete.error_count,
                    },
                );
                // Codes only arrive with the final report; skip errors from before a resume
                for error in complete.error_list.iter().skip(resumed_failures) {
                    tracker.record_error_code(&error.code);
                }
                tracker.log_summary("Review import");
                print_completion(&complete, output);
                output.data("batch", &BatchReport::Complete(complete));
                return Ok(());
            }
        }
    }
}

/// Run one `import_batch` call on the blocking pool, bounded by `budget` when set
async fn run_chunk(
    coordinator: Arc<BatchCoordinator>,
    upload_id: &str,
    offset: usize,
    budget: Option<Duration>,
) -> Result<BatchReport> {
    let id = upload_id.to_string();
    let task = tokio::task::spawn_blocking(move || coordinator.import_batch(&id, offset));

    let joined = match budget {
        Some(budget) => tokio::time::timeout(budget, task).await.map_err(|_| {
            eyre!(
                "Chunk at offset {} did not finish within {}s and is still running. \
                 Check 'review-import status {}' for the offset to resume from.",
                offset,
                budget.as_secs(),
                upload_id
            )
        })?,
        None => task.await,
    };

    let report = joined.map_err(|e| eyre!("Import task failed: {}", e))??;
    Ok(report)
}

/// Cumulative counts from the last report seen
#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    created: usize,
    updated: usize,
    failed: usize,
}

impl Counts {
    /// Feed the growth since `self` into the tracker and return the new totals
    fn advance(self, tracker: &mut ImportProgressTracker, now: Counts) -> Counts {
        tracker.record_created(now.created.saturating_sub(self.created));
        tracker.record_updated(now.updated.saturating_sub(self.updated));
        tracker.record_failed(now.failed.saturating_sub(self.failed));
        now
    }
}

fn print_completion(complete: &CompleteReport, output: &Output) {
    if complete.error_count == 0 {
        output.success(&complete.message);
        return;
    }

    output.warn(&complete.message);

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Row").add_attribute(Attribute::Bold),
        Cell::new("Code").add_attribute(Attribute::Bold),
        Cell::new("Message").add_attribute(Attribute::Bold),
    ]);
    for error in &complete.error_list {
        table.add_row(vec![
            Cell::new(error.row_number),
            Cell::new(&error.code),
            Cell::new(&error.message),
        ]);
    }
    output.table(table);
}
