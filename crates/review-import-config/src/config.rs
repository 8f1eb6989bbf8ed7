use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Address recorded for reviews when neither the row nor the settings supply one
pub const SERVER_FALLBACK_IP: &str = "127.0.0.1";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub settings: ImportSettings,
    #[serde(default)]
    pub import: ImportOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Store-level review settings, read-only for the duration of an import
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportSettings {
    #[serde(default = "default_min_review_length")]
    pub min_review_length: usize,
    #[serde(default)]
    pub create_user_accounts: bool,
    /// Empty means "use the server address"
    #[serde(default)]
    pub default_ip_address: String,
    #[serde(default = "default_true")]
    pub auto_approve_reviews: bool,
    #[serde(default)]
    pub reviews_are_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportOptions {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json_logging")]
    pub json: bool,
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_min_review_length() -> usize {
    10
}

fn default_batch_size() -> usize {
    50
}

fn default_session_ttl_seconds() -> u64 {
    3600 // 1 hour
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_logging() -> bool {
    use std::io::IsTerminal;
    !std::io::stdout().is_terminal()
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            min_review_length: default_min_review_length(),
            create_user_accounts: false,
            default_ip_address: String::new(),
            auto_approve_reviews: default_true(),
            reviews_are_verified: false,
        }
    }
}

impl ImportSettings {
    /// Apply the same clean-up the settings form does on save:
    /// minimum length of at least 1, default IP kept only when it parses.
    pub fn sanitized(mut self) -> Self {
        self.min_review_length = self.min_review_length.max(1);
        let ip = self.default_ip_address.trim();
        self.default_ip_address = if ip.parse::<IpAddr>().is_ok() {
            ip.to_string()
        } else {
            String::new()
        };
        self
    }

    /// Address used when a row carries no valid IP
    pub fn effective_default_ip(&self) -> &str {
        if self.default_ip_address.is_empty() {
            SERVER_FALLBACK_IP
        } else {
            &self.default_ip_address
        }
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            session_ttl_seconds: default_session_ttl_seconds(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json_logging(),
            file: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if present, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.import.batch_size == 0 {
            return Err(anyhow::anyhow!("import.batch_size must be greater than zero"));
        }
        if self.import.session_ttl_seconds == 0 {
            return Err(anyhow::anyhow!("import.session_ttl_seconds must be greater than zero"));
        }
        if self.import.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("import.max_upload_bytes must be greater than zero"));
        }
        Ok(())
    }
}
