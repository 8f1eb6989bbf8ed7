use review_import_sources::SourceError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a record or session store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store data could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Rejected(String),
}

/// Row-level failure categories, each with a stable snake_case code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportErrorKind {
    MissingField,
    InvalidRating,
    ProductNotFound,
    InvalidEmail,
    ReviewTooShort,
    CommentInsertFailed,
    ReviewUpdateFailed,
    StoreError,
}

impl ImportErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidRating => "invalid_rating",
            Self::ProductNotFound => "product_not_found",
            Self::InvalidEmail => "invalid_email",
            Self::ReviewTooShort => "review_too_short",
            Self::CommentInsertFailed => "comment_insert_failed",
            Self::ReviewUpdateFailed => "review_update_failed",
            Self::StoreError => "store_error",
        }
    }
}

/// Why a single row was not imported
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ImportError {
    pub kind: ImportErrorKind,
    pub message: String,
}

impl ImportError {
    pub fn new(kind: ImportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(ImportErrorKind::MissingField, format!("Missing required field: {}", field))
    }

    pub fn invalid_rating() -> Self {
        Self::new(ImportErrorKind::InvalidRating, "Star rating must be 1-5")
    }

    pub fn product_not_found(sku: &str) -> Self {
        Self::new(ImportErrorKind::ProductNotFound, format!("Product not found: {}", sku))
    }

    pub fn invalid_email(raw: &str) -> Self {
        Self::new(ImportErrorKind::InvalidEmail, format!("Invalid email: {}", raw))
    }

    pub fn review_too_short(min_length: usize) -> Self {
        Self::new(
            ImportErrorKind::ReviewTooShort,
            format!("Review text too short (minimum {} characters)", min_length),
        )
    }

    pub fn comment_insert_failed() -> Self {
        Self::new(ImportErrorKind::CommentInsertFailed, "Failed to create review")
    }

    pub fn review_update_failed(review_id: u64) -> Self {
        Self::new(
            ImportErrorKind::ReviewUpdateFailed,
            format!("Failed to update review {}", review_id),
        )
    }

    pub fn store(context: &str, err: &StoreError) -> Self {
        Self::new(ImportErrorKind::StoreError, format!("{}: {}", context, err))
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// Failure that aborts a whole batch call for an upload
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid upload ID.")]
    InvalidUploadId,

    #[error("Upload session expired. Please upload the file again.")]
    Expired(String),

    #[error("CSV file not found.")]
    FileMissing(PathBuf),

    #[error("Failed to read uploaded file: {0}")]
    Source(#[from] SourceError),

    #[error("Session store failed: {0}")]
    Store(#[from] StoreError),
}

/// Failure that rejects an upload before any session exists
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file uploaded.")]
    NoFile,

    #[error("Invalid file type. Only CSV files are allowed.")]
    InvalidType,

    #[error("File too large. Maximum size is {}MB.", .max_bytes / (1024 * 1024))]
    TooLarge { size: u64, max_bytes: u64 },

    #[error("Failed to move uploaded file.")]
    Copy(#[source] std::io::Error),

    #[error("Failed to read CSV file.")]
    Unreadable(#[source] SourceError),

    #[error("{}", .0.join(" "))]
    Invalid(Vec<String>),

    #[error("Session store failed: {0}")]
    Store(#[from] StoreError),
}
