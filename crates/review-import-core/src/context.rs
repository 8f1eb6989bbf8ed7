use crate::record_store::RecordStore;
use crate::repository::{ProductRepository, ReviewRepository, UserRepository};
use crate::session_store::{MemorySessionStore, SessionStore};
use chrono::{Local, NaiveDateTime};
use review_import_config::{ImportOptions, ImportSettings};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source of "now" for rows without a usable review date
pub type Clock = fn() -> NaiveDateTime;

pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Everything an import needs from its surroundings, built once and shared
/// by the coordinator and the importer.
#[derive(Clone)]
pub struct ImportContext {
    pub products: Arc<dyn ProductRepository>,
    pub users: Arc<dyn UserRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub sessions: Arc<dyn SessionStore>,
    pub settings: ImportSettings,
    pub options: ImportOptions,
    /// Where accepted uploads are copied
    pub upload_dir: PathBuf,
    pub clock: Clock,
}

impl ImportContext {
    /// Context whose three repositories are all backed by one record store
    pub fn with_record_store(
        store: Arc<RecordStore>,
        sessions: Arc<dyn SessionStore>,
        settings: ImportSettings,
        options: ImportOptions,
        upload_dir: &Path,
    ) -> Self {
        Self {
            products: store.clone(),
            users: store.clone(),
            reviews: store,
            sessions,
            settings: settings.sanitized(),
            options,
            upload_dir: upload_dir.to_path_buf(),
            clock: local_now,
        }
    }

    /// In-memory stores and default settings
    pub fn in_memory(upload_dir: &Path) -> (Self, Arc<RecordStore>) {
        let store = Arc::new(RecordStore::in_memory());
        let context = Self::with_record_store(
            store.clone(),
            Arc::new(MemorySessionStore::new()),
            ImportSettings::default(),
            ImportOptions::default(),
            upload_dir,
        );
        (context, store)
    }

    pub fn with_settings(mut self, settings: ImportSettings) -> Self {
        self.settings = settings.sanitized();
        self
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}
