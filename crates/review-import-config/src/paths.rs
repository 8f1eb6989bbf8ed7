use anyhow::Result;
use std::path::{Path, PathBuf};

pub const BASE_PATH_ENV: &str = "REVIEW_IMPORT_BASE_PATH";

/// Base directory from `REVIEW_IMPORT_BASE_PATH`, if set and non-empty
pub fn base_path_override() -> Option<PathBuf> {
    std::env::var_os(BASE_PATH_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("review-import");

        Ok(Self::from_base(base_dir))
    }

    /// Config files at the base level, data in a subdirectory
    pub fn from_base(base: PathBuf) -> Self {
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
        }
    }

    /// `override_base` wins; otherwise the platform config directory, then
    /// `.review-import` under the working directory
    pub fn resolve(override_base: Option<PathBuf>) -> Self {
        if let Some(base) = override_base {
            return Self::from_base(base);
        }
        Self::new().unwrap_or_else(|_| Self::from_base(PathBuf::from(".review-import")))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Uploaded CSV files live here until their import completes or expires
    pub fn upload_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn session_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    pub fn store_file(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.upload_dir())?;
        std::fs::create_dir_all(self.session_dir())?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // ~/.config/review-import on Linux unless overridden
        Self::resolve(base_path_override())
    }
}
