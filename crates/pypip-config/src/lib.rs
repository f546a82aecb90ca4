pub mod manager;
pub mod types;

pub use manager::{ConfigError, ConfigManager, CONFIG_ENV, INDEX_URL_ENV, PYTHON_ENV};
pub use types::{PypipConfig, Settings};
