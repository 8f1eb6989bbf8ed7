pub mod catalog;
pub mod clear;
pub mod config;
pub mod import;
pub mod run_ui;
pub mod status;
pub mod template;
pub mod upload;
pub mod validate;

use color_eyre::Result;
use review_import_config::{Config, PathManager};
use review_import_core::{BatchCoordinator, FileSessionStore, ImportContext, RecordStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Paths and configuration shared by every command
pub struct Workspace {
    pub paths: PathManager,
    pub config_file: PathBuf,
    pub config: Config,
}

impl Workspace {
    /// Load `config_override` or the default config file; defaults when it does not exist
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let paths = PathManager::default();
        let config_file = config_override.unwrap_or_else(|| paths.config_file());

        let config = Config::load_or_default(&config_file)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
        config
            .validate()
            .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

        Ok(Self {
            paths,
            config_file,
            config,
        })
    }

    pub fn open_store(&self) -> Result<Arc<RecordStore>> {
        let store_file = self.paths.store_file();
        let store = RecordStore::open(&store_file)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to open record store {}: {}", store_file.display(), e))?;
        Ok(Arc::new(store))
    }

    pub fn coordinator(&self) -> Result<BatchCoordinator> {
        self.paths
            .ensure_directories()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create data directories: {}", e))?;

        let sessions = FileSessionStore::new(&self.paths.session_dir())?;
        let context = ImportContext::with_record_store(
            self.open_store()?,
            Arc::new(sessions),
            self.config.settings.clone(),
            self.config.import.clone(),
            &self.paths.upload_dir(),
        );
        Ok(BatchCoordinator::new(context))
    }
}
