pub mod config;
pub mod paths;

pub use config::{Config, ImportOptions, ImportSettings, LoggingConfig, SERVER_FALLBACK_IP};
pub use paths::{base_path_override, PathManager, BASE_PATH_ENV};
