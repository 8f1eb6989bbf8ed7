pub mod context;
pub mod coordinator;
pub mod error;
pub mod importer;
pub mod progress;
pub mod record_store;
pub mod repository;
pub mod sanitize;
pub mod session_store;

pub use context::{local_now, Clock, ImportContext};
pub use coordinator::{
    BatchCoordinator, BatchReport, CompleteReport, InProgressReport, SessionState, SessionStatus, UploadReceipt,
};
pub use error::{ImportError, ImportErrorKind, SessionError, StoreError, UploadError};
pub use importer::{BatchResult, BatchRowError, ImportOutcome, ReviewImporter, REQUIRED_FIELDS};
pub use progress::ImportProgressTracker;
pub use record_store::RecordStore;
pub use repository::{ProductRepository, ReviewRepository, UserRepository};
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore};
