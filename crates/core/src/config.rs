//! Configuration management for stowage

use crate::client::{ClientConfig, DEFAULT_STORAGE_ENDPOINT};
use crate::error::{Error, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration directory name
const CONFIG_DIR: &str = "stowage";

/// Configuration file name
const CONFIG_FILE: &str = "config.toml";

/// Longest signed URL lifetime accepted, in seconds (7 days)
pub const MAX_EXPIRATION: u64 = 604800;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub storage: StorageConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    pub advanced: Option<AdvancedConfig>,
    pub logging: Option<LoggingConfig>,
}

/// Storage service connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

/// Defaults used by the CLI when a flag is omitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default = "default_expiration")]
    pub expires_in: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            expires_in: default_expiration(),
        }
    }
}

/// Advanced configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl ConfigFile {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            storage: StorageConfig {
                base_url: base_url.into(),
                api_key: api_key.into(),
                endpoint: default_endpoint(),
            },
            defaults: DefaultsConfig::default(),
            advanced: None,
            logging: None,
        }
    }

    /// Connection settings for [`StorageClient`](crate::StorageClient)
    pub fn client_config(&self) -> ClientConfig {
        let advanced = self.advanced.clone().unwrap_or_default();

        let config = ClientConfig::new(&self.storage.base_url, &self.storage.api_key)
            .with_storage_endpoint(&self.storage.endpoint);

        // 0 disables the client-wide timeout
        match advanced.timeout {
            0 => config,
            secs => config.with_timeout(Duration::from_secs(secs)),
        }
    }
}

// Default values
fn default_endpoint() -> String {
    DEFAULT_STORAGE_ENDPOINT.to_string()
}

fn default_expiration() -> u64 {
    3600 // 1 hour
}

fn default_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let home =
        home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
    let config_dir = home.join(".config").join(CONFIG_DIR);

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
    }

    Ok(config_dir)
}

/// Get the configuration file path
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

/// Load configuration from the default location
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&get_config_path()?)
}

/// Load configuration from `path`
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        Error::InvalidConfig(format!("Failed to read config file: {}", e))
    })?;

    let config: ConfigFile = toml::from_str(&content).map_err(|e| {
        Error::InvalidConfig(format!("Failed to parse config file: {}", e))
    })?;

    Ok(config)
}

/// Save configuration to the default location
pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &get_config_path()?)
}

/// Save configuration to `path`, readable by the owner only
pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;

    fs::write(path, content).map_err(|e| {
        Error::Config(format!("Failed to write config file: {}", e))
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }

    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &ConfigFile) -> Result<()> {
    let base_url = config.storage.base_url.trim();
    if base_url.is_empty() {
        return Err(Error::InvalidInput("Base URL cannot be empty".to_string()));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(Error::InvalidInput(format!(
            "Base URL must start with http:// or https:// (got {})",
            base_url
        )));
    }

    if config.storage.api_key.is_empty() {
        return Err(Error::Config("No API key configured".to_string()));
    }

    if config.storage.endpoint.trim_matches('/').is_empty() {
        return Err(Error::InvalidInput("Storage endpoint cannot be empty".to_string()));
    }

    if let Some(bucket) = &config.defaults.bucket {
        if bucket.is_empty() {
            return Err(Error::InvalidInput("Default bucket cannot be empty".to_string()));
        }
    }

    if config.defaults.expires_in == 0 || config.defaults.expires_in > MAX_EXPIRATION {
        return Err(Error::InvalidInput(format!(
            "Default expiration must be between 1 and {} seconds",
            MAX_EXPIRATION
        )));
    }

    if let Some(advanced) = &config.advanced {
        if advanced.timeout == 0 {
            return Err(Error::InvalidInput(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
    }

    Ok(())
}

/// Check if configuration exists
pub fn config_exists() -> bool {
    get_config_path().map(|p| p.exists()).unwrap_or(false)
}
