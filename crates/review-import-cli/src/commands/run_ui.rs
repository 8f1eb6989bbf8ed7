use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

/// Progress display for a full import run.
///
/// Draws a bar on a terminal; otherwise every update becomes a log event.
pub struct RunUI {
    bar: ProgressBar,
    interactive: bool,
}

impl RunUI {
    pub fn new(total_rows: usize, start_offset: usize, quiet: bool) -> Self {
        let interactive = is_interactive() && !quiet;

        let bar = if interactive {
            ProgressBar::new(total_rows as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} rows ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }
        bar.set_position(start_offset as u64);
        bar.set_message("Importing...");

        if !interactive {
            tracing::info!(
                operation = "ui_init",
                mode = "non_interactive",
                "Running in non-interactive mode - progress bar disabled, using structured logging"
            );
        }

        Self { bar, interactive }
    }

    pub fn update(&self, processed: usize, total: usize, message: &str) {
        if self.interactive {
            self.bar.set_position(processed as u64);
            self.bar.set_message(message.to_string());
        } else {
            let percent = if total > 0 {
                (processed as f64 / total as f64 * 100.0).min(100.0) as u8
            } else {
                100
            };
            tracing::info!(
                operation = "progress",
                current = processed,
                total = total,
                percent = percent,
                message = message,
                "Import progress update"
            );
        }
    }

    pub fn finish(&self, message: &str) {
        if self.interactive {
            self.bar.finish_with_message(message.to_string());
        }
    }

    /// Leave the bar where it stopped
    pub fn abandon(&self, message: &str) {
        if self.interactive {
            self.bar.abandon_with_message(message.to_string());
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
