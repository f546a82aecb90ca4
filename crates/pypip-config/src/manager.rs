use crate::types::{PypipConfig, Settings};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides the config file location
pub const CONFIG_ENV: &str = "PYPIP_CONFIG";
/// Overrides `settings.python`
pub const PYTHON_ENV: &str = "PYPIP_PYTHON";
/// Overrides `settings.index_url`
pub const INDEX_URL_ENV: &str = "PYPIP_INDEX_URL";

/// Errors that can occur during config management
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("Config file already exists at {0}")]
    ConfigExists(PathBuf),

    #[error("Invalid setting '{0}': {1}")]
    Invalid(String, String),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

/// Manager for pypip configuration
///
/// Settings live in `<config dir>/pypip/config.toml` unless `PYPIP_CONFIG`
/// points elsewhere. A missing file means defaults.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    config: PypipConfig,
}

impl ConfigManager {
    /// Get the config path, honouring `PYPIP_CONFIG`
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Self::config_path_with(|key| std::env::var(key).ok())
    }

    /// Get the config path using a custom environment lookup
    pub fn config_path_with(env: impl Fn(&str) -> Option<String>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = env(CONFIG_ENV).filter(|p| !p.trim().is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let dir = dirs::config_dir().ok_or(ConfigError::ConfigDirNotFound)?;
        Ok(dir.join("pypip").join("config.toml"))
    }

    /// Load config from the default location, applying environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(|key| std::env::var(key).ok())
    }

    /// Load config using a custom environment lookup (useful for testing)
    pub fn load_with_env(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config_path = Self::config_path_with(&env)?;
        let mut manager = if config_path.is_file() {
            Self::load_from(&config_path)?
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Self {
                config_path,
                config: PypipConfig::default(),
            }
        };
        manager.apply_env(&env);
        manager.validate()?;
        Ok(manager)
    }

    /// Load config from specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: PypipConfig = toml::from_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded config");

        let manager = Self {
            config_path: path.to_path_buf(),
            config,
        };
        manager.validate()?;
        Ok(manager)
    }

    /// Initialize a new config file with defaults at the default location
    pub fn init() -> Result<Self, ConfigError> {
        Self::init_at(&Self::config_path()?)
    }

    /// Initialize config at specific path
    pub fn init_at(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Err(ConfigError::ConfigExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let manager = Self {
            config_path: path.to_path_buf(),
            config: PypipConfig::default(),
        };
        manager.save()?;
        Ok(manager)
    }

    /// Save config to disk atomically
    ///
    /// Uses a temporary file and atomic rename to prevent corruption
    pub fn save(&self) -> Result<(), ConfigError> {
        let toml_str = self.to_toml()?;
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, &toml_str)?;
        std::fs::rename(&temp_path, &self.config_path)?;
        tracing::info!(path = %self.config_path.display(), "saved config");
        Ok(())
    }

    /// Render the current config as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self.config)?)
    }

    /// Path of the config file (which may not exist yet)
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get reference to config
    pub fn config(&self) -> &PypipConfig {
        &self.config
    }

    /// Get reference to settings
    pub fn settings(&self) -> &Settings {
        &self.config.settings
    }

    /// Get mutable reference to settings (caller must call save())
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.config.settings
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let settings = &mut self.config.settings;
        if let Some(python) = env(PYTHON_ENV).filter(|v| !v.trim().is_empty()) {
            settings.python = python;
        }
        if let Some(index_url) = env(INDEX_URL_ENV).filter(|v| !v.trim().is_empty()) {
            settings.index_url = index_url;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let settings = &self.config.settings;
        if settings.python.trim().is_empty() {
            return Err(ConfigError::Invalid("python".to_string(), "must not be empty".to_string()));
        }
        if let Err(err) = settings.default_section() {
            return Err(ConfigError::Invalid("default_group".to_string(), err.to_string()));
        }
        if settings.requests_per_second == 0 {
            return Err(ConfigError::Invalid(
                "requests_per_second".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
