use pypip_deps::{PinStrategy, SectionKey};
use serde::{Deserialize, Serialize};

/// Main configuration structure for pypip
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PypipConfig {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: String,

    /// User settings
    #[serde(default)]
    pub settings: Settings,
}

impl Default for PypipConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            settings: Settings::default(),
        }
    }
}

/// User settings, every field optional in the file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Interpreter used to run `-m pip`
    #[serde(default = "default_python")]
    pub python: String,

    /// Section edited when no `--dependency-group` is given
    #[serde(default = "default_group")]
    pub default_group: String,

    /// How unversioned installs are recorded
    #[serde(default)]
    pub pin: PinStrategy,

    /// Keep requirements.txt in sync when it exists
    #[serde(default = "default_true")]
    pub sync_requirements: bool,

    /// Requirements file name, relative to the project root
    #[serde(default = "default_requirements_file")]
    pub requirements_file: String,

    /// Mirror optional groups into `optional-dependencies.all`
    #[serde(default = "default_true")]
    pub mirror_all_group: bool,

    /// Package index for `find` and `info`
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Client-side rate limit for index requests
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            python: default_python(),
            default_group: default_group(),
            pin: PinStrategy::default(),
            sync_requirements: default_true(),
            requirements_file: default_requirements_file(),
            mirror_all_group: default_true(),
            index_url: default_index_url(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

impl Settings {
    /// Parsed `default_group`
    pub fn default_section(&self) -> pypip_deps::Result<SectionKey> {
        self.default_group.parse()
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_group() -> String {
    "dependencies".to_string()
}

fn default_true() -> bool {
    true
}

fn default_requirements_file() -> String {
    pypip_deps::project::DEFAULT_REQUIREMENTS_FILE.to_string()
}

fn default_index_url() -> String {
    "https://pypi.org/".to_string()
}

fn default_requests_per_second() -> u32 {
    1
}
