use crate::context::ImportContext;
use crate::error::{SessionError, StoreError, UploadError};
use crate::importer::{BatchResult, ReviewImporter};
use crate::progress::ImportProgressTracker;
use crate::session_store::{self, progress_key, upload_key};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use review_import_models::{ImportProgress, RowError, UploadSession};
use review_import_sources::source_for_path;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const UPLOAD_ID_LENGTH: usize = 12;
const TEMP_NAME_SUFFIX_LENGTH: usize = 8;

/// Returned by a successful upload
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadReceipt {
    pub upload_id: String,
    pub total_rows: usize,
    pub headers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InProgressReport {
    pub processed: usize,
    pub total: usize,
    pub success: usize,
    pub updated: usize,
    pub error_count: usize,
    pub complete: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompleteReport {
    pub success: usize,
    pub updated: usize,
    pub error_count: usize,
    pub error_list: Vec<RowError>,
    pub complete: bool,
    pub message: String,
}

/// Outcome of one `import_batch` call
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum BatchReport {
    InProgress(InProgressReport),
    Complete(CompleteReport),
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InProgress(report) => &report.message,
            Self::Complete(report) => &report.message,
        }
    }

    /// Offset for the next call, if there is one
    pub fn next_offset(&self) -> Option<usize> {
        match self {
            Self::InProgress(report) => Some(report.processed),
            Self::Complete(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Accepted, no batch run yet
    Validated,
    Importing { offset: usize },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionStatus {
    pub session: UploadSession,
    #[serde(flatten)]
    pub state: SessionState,
    pub progress: ImportProgress,
}

fn progress_message(processed: usize, total: usize) -> String {
    format!("Processed {} of {} rows...", processed, total)
}

fn completion_message(progress: &ImportProgress) -> String {
    let mut message = format!(
        "Import complete! Created {} new reviews, updated {} existing reviews.",
        progress.success, progress.updated
    );
    if progress.error_count() > 0 {
        message.push_str(&format!(" {} errors occurred.", progress.error_count()));
    }
    message
}

fn random_alphanumeric(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Drives an uploaded file through validation and chunked import.
///
/// Calls are stateless apart from the session store: each `import_batch`
/// reads one chunk at the offset the caller passes, so a caller resumes by
/// passing back the `processed` count of the previous report.
pub struct BatchCoordinator {
    context: ImportContext,
    importer: ReviewImporter,
}

impl BatchCoordinator {
    pub fn new(context: ImportContext) -> Self {
        let importer = ReviewImporter::new(&context);
        Self { context, importer }
    }

    pub fn context(&self) -> &ImportContext {
        &self.context
    }

    fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.context.options.session_ttl_seconds)
    }

    /// Accept a CSV file: copy it into the upload directory, validate it and
    /// open a session for it.
    pub fn upload(&self, file: &Path) -> Result<UploadReceipt, UploadError> {
        let metadata = match std::fs::metadata(file) {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return Err(UploadError::NoFile),
        };

        let is_csv = file
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Err(UploadError::InvalidType);
        }

        let max_bytes = self.context.options.max_upload_bytes;
        if metadata.len() > max_bytes {
            return Err(UploadError::TooLarge {
                size: metadata.len(),
                max_bytes,
            });
        }

        let temp_path = self.copy_into_upload_dir(file)?;

        let mut source = match source_for_path(&temp_path) {
            Ok(source) => source,
            Err(e) => {
                discard_upload(&temp_path);
                return Err(UploadError::Unreadable(e));
            }
        };
        let headers = source.headers();
        let validation = source.validate();

        let headers = match headers {
            Ok(headers) => headers,
            Err(e) => {
                debug!("Rejected upload {:?}: {}", file, e);
                discard_upload(&temp_path);
                return Err(UploadError::Unreadable(e));
            }
        };
        if !validation.valid {
            debug!("Rejected upload {:?}: {}", file, validation.errors.join(" "));
            discard_upload(&temp_path);
            return Err(UploadError::Invalid(validation.errors));
        }

        let session = UploadSession {
            upload_id: random_alphanumeric(UPLOAD_ID_LENGTH),
            file_path: temp_path.clone(),
            total_rows: source.total_rows(),
            headers,
            uploaded_at: Utc::now(),
        };

        if let Err(e) = session_store::save(
            self.context.sessions.as_ref(),
            &upload_key(&session.upload_id),
            &session,
            self.session_ttl(),
        ) {
            discard_upload(&temp_path);
            return Err(e.into());
        }

        info!(
            "Accepted upload {:?} as {} ({} rows)",
            file, session.upload_id, session.total_rows
        );
        Ok(UploadReceipt {
            upload_id: session.upload_id,
            total_rows: session.total_rows,
            headers: session.headers,
        })
    }

    fn copy_into_upload_dir(&self, file: &Path) -> Result<PathBuf, UploadError> {
        std::fs::create_dir_all(&self.context.upload_dir).map_err(UploadError::Copy)?;

        let temp_name = format!(
            "import_{}_{}.csv",
            Utc::now().timestamp(),
            random_alphanumeric(TEMP_NAME_SUFFIX_LENGTH)
        );
        let temp_path = self.context.upload_dir.join(temp_name);
        std::fs::copy(file, &temp_path).map_err(UploadError::Copy)?;
        Ok(temp_path)
    }

    fn load_session(&self, upload_id: &str) -> Result<UploadSession, SessionError> {
        if upload_id.trim().is_empty() {
            return Err(SessionError::InvalidUploadId);
        }
        session_store::load(self.context.sessions.as_ref(), &upload_key(upload_id))?
            .ok_or_else(|| SessionError::Expired(upload_id.to_string()))
    }

    fn load_progress(&self, upload_id: &str) -> Result<Option<ImportProgress>, StoreError> {
        session_store::load(self.context.sessions.as_ref(), &progress_key(upload_id))
    }

    /// Import the chunk that starts `offset` data rows into the file.
    ///
    /// When no rows are left the upload is finished: the temporary file and
    /// both session records are removed and the final totals returned.
    pub fn import_batch(&self, upload_id: &str, offset: usize) -> Result<BatchReport, SessionError> {
        let session = self.load_session(upload_id)?;

        if !session.file_path.exists() {
            warn!("Upload {} lost its file {:?}", upload_id, session.file_path);
            self.context.sessions.delete(&upload_key(upload_id))?;
            return Err(SessionError::FileMissing(session.file_path));
        }

        let mut source = source_for_path(&session.file_path)?;
        let batch = source.read_batch(offset, self.context.options.batch_size)?;

        let mut progress = self.load_progress(upload_id)?.unwrap_or_default();

        if batch.is_exhausted() {
            return self.finish(&session, progress);
        }

        let result = self.importer.import_reviews(&batch.rows);
        log_batch_summary(&result, batch.rows.len(), offset, self.context.options.batch_size);

        progress.processed += batch.consumed;
        progress.success += result.success_count;
        progress.updated += result.updated_count;
        progress.errors.extend(result.errors.into_iter().map(|e| RowError {
            row_number: e.row_number,
            code: e.code.to_string(),
            message: e.message,
        }));

        session_store::save(
            self.context.sessions.as_ref(),
            &progress_key(upload_id),
            &progress,
            self.session_ttl(),
        )?;

        Ok(BatchReport::InProgress(InProgressReport {
            processed: progress.processed,
            total: session.total_rows,
            success: progress.success,
            updated: progress.updated,
            error_count: progress.error_count(),
            complete: false,
            message: progress_message(progress.processed, session.total_rows),
        }))
    }

    fn finish(&self, session: &UploadSession, progress: ImportProgress) -> Result<BatchReport, SessionError> {
        discard_upload(&session.file_path);
        self.context.sessions.delete(&upload_key(&session.upload_id))?;
        self.context.sessions.delete(&progress_key(&session.upload_id))?;

        let message = completion_message(&progress);
        info!("Upload {}: {}", session.upload_id, message);

        Ok(BatchReport::Complete(CompleteReport {
            success: progress.success,
            updated: progress.updated,
            error_count: progress.error_count(),
            error_list: progress.errors,
            complete: true,
            message,
        }))
    }

    /// Where an upload stands, without touching it
    pub fn status(&self, upload_id: &str) -> Result<SessionStatus, SessionError> {
        let session = self.load_session(upload_id)?;
        let (state, progress) = match self.load_progress(upload_id)? {
            Some(progress) => (
                SessionState::Importing {
                    offset: progress.processed,
                },
                progress,
            ),
            None => (SessionState::Validated, ImportProgress::default()),
        };

        Ok(SessionStatus {
            session,
            state,
            progress,
        })
    }

    /// Remove expired session records, then upload files older than the
    /// session lifetime that no live session refers to.
    ///
    /// Returns (sessions purged, files removed).
    pub fn clear_expired(&self) -> Result<(usize, usize), StoreError> {
        let sessions = self.context.sessions.purge_expired()?;

        let dir = &self.context.upload_dir;
        if !dir.exists() {
            return Ok((sessions, 0));
        }

        let ttl = self.session_ttl();
        let mut files = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_upload = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("import_") && name.ends_with(".csv"));
            if !is_upload {
                continue;
            }

            let age = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| modified.elapsed().ok());
            if age.is_some_and(|age| age >= ttl) {
                discard_upload(&path);
                files += 1;
            }
        }

        if sessions > 0 || files > 0 {
            info!("Cleared {} expired sessions and {} stale upload files", sessions, files);
        }
        Ok((sessions, files))
    }
}

fn log_batch_summary(result: &BatchResult, rows: usize, offset: usize, batch_size: usize) {
    let mut tracker = ImportProgressTracker::new(rows, batch_size);
    tracker.record_created(result.success_count);
    tracker.record_updated(result.updated_count);
    for error in &result.errors {
        tracker.record_failed_with_error(error.code);
    }
    tracker.log_summary(&format!("Batch at offset {}", offset));
}

fn discard_upload(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to delete upload file {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests;
