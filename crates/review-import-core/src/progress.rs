use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

/// Running totals for an import, logged at intervals and summarized at the end
pub struct ImportProgressTracker {
    total: usize,
    created: usize,
    updated: usize,
    failed: usize,
    start_time: Instant,
    progress_interval: usize, // Log every N rows
    last_progress_log: usize,
    error_counts: HashMap<String, usize>, // by error code
}

impl ImportProgressTracker {
    /// `progress_interval` is normally the batch size
    pub fn new(total: usize, progress_interval: usize) -> Self {
        Self {
            total,
            created: 0,
            updated: 0,
            failed: 0,
            start_time: Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    /// Log the row count once, before the first batch runs
    pub fn log_start(&self, start_offset: usize) {
        if start_offset > 0 {
            info!("Resuming import at row offset {}: {} rows in total", start_offset, self.total);
        } else if self.total > 0 {
            info!("Starting import: {} rows to process", self.total);
        }
    }

    pub fn record_created(&mut self, count: usize) {
        self.created += count;
    }

    pub fn record_updated(&mut self, count: usize) {
        self.updated += count;
    }

    pub fn record_failed_with_error(&mut self, code: &str) {
        self.record_failed(1);
        self.record_error_code(code);
    }

    /// Failed rows whose codes are not known yet
    pub fn record_failed(&mut self, count: usize) {
        self.failed += count;
    }

    /// Count a code for the breakdown without touching the failed total
    pub fn record_error_code(&mut self, code: &str) {
        *self.error_counts.entry(code.to_string()).or_insert(0) += 1;
    }

    /// Log if the interval has been reached; `current` is rows processed so far
    pub fn log_progress(&mut self, current: usize) {
        if current.saturating_sub(self.last_progress_log) < self.progress_interval && current < self.total {
            return;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { current as f64 / elapsed } else { 0.0 };

        info!(
            "Progress: {}/{} ({:.1} rows/sec) | Created: {} | Updated: {} | Failed: {}",
            current, self.total, rate, self.created, self.updated, self.failed
        );
        self.last_progress_log = current;
    }

    /// Error codes with counts, most frequent first
    pub fn error_breakdown(&self) -> Vec<(String, usize)> {
        let mut entries: Vec<(String, usize)> = self
            .error_counts
            .iter()
            .map(|(code, count)| (code.clone(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed().as_secs_f64();

        if self.failed == 0 {
            info!(
                "{} completed: {} rows in {:.1}s | Created: {} | Updated: {} | Failed: 0",
                operation_name, self.total, elapsed, self.created, self.updated
            );
            return;
        }

        // WARN so failed rows stand out in the summary
        warn!(
            "{} completed: {} rows in {:.1}s | Created: {} | Updated: {} | Failed: {}",
            operation_name, self.total, elapsed, self.created, self.updated, self.failed
        );

        let breakdown: Vec<String> = self
            .error_breakdown()
            .iter()
            .map(|(code, count)| format!("{}: {}", code, count))
            .collect();
        info!("Error breakdown: {}", breakdown.join(", "));
    }
}
