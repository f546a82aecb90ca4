pub mod config;
pub mod find;
pub mod info;
pub mod install;
pub mod show;
pub mod uninstall;

pub use config::{handle_config_command, ConfigCommand};
pub use find::{handle_find_command, FindArgs};
pub use info::{handle_info_command, InfoArgs};
pub use install::{handle_install_command, InstallArgs};
pub use show::{handle_show_command, ShowArgs};
pub use uninstall::{handle_uninstall_command, UninstallArgs};

use anyhow::{Context, Result};
use pypip_config::{ConfigManager, Settings};
use pypip_deps::{InstallEnvironment, MutationOptions, Project, SectionKey, SyncOptions};
use pypip_info::InfoClient;
use std::path::PathBuf;

/// Settings and global flags shared by every command
///
/// Flags given on the command line win over the config file and the
/// `PYPIP_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Loaded settings, with CLI overrides applied
    pub settings: Settings,
    /// `--project`; the current directory is searched upward otherwise
    pub project_dir: Option<PathBuf>,
    /// `--hatch-env`
    pub hatch_env: Option<String>,
}

impl AppContext {
    /// Load the user config and apply CLI overrides
    pub fn load(project_dir: Option<PathBuf>, hatch_env: Option<String>, python: Option<String>) -> Result<Self> {
        let manager = ConfigManager::load().context("Failed to load pypip config")?;
        let mut settings = manager.settings().clone();
        if let Some(python) = python {
            settings.python = python;
        }
        Ok(Self::new(settings, project_dir, hatch_env))
    }

    pub fn new(settings: Settings, project_dir: Option<PathBuf>, hatch_env: Option<String>) -> Self {
        Self {
            settings,
            project_dir,
            hatch_env: hatch_env.filter(|env| !env.trim().is_empty()),
        }
    }

    /// The project to operate on
    pub fn project(&self) -> Result<Project> {
        let project = match &self.project_dir {
            Some(dir) => Project::at(dir)?,
            None => {
                let cwd = std::env::current_dir().context("Failed to read current directory")?;
                Project::discover(&cwd)?
            }
        };
        Ok(project.with_requirements_file(&self.settings.requirements_file))
    }

    /// Interpreter and hatch environment pip runs in
    pub fn environment(&self) -> InstallEnvironment {
        InstallEnvironment::new(&self.settings.python).with_hatch_env(self.hatch_env.clone())
    }

    /// Section targeted by `-g GROUP`, falling back to the configured default
    pub fn section(&self, group: Option<&str>) -> Result<SectionKey> {
        let group = group.unwrap_or(&self.settings.default_group);
        Ok(SectionKey::select(group, self.hatch_env.as_deref())?)
    }

    pub fn sync_options(&self, section: SectionKey, dry_run: bool) -> SyncOptions {
        SyncOptions {
            section,
            pin: self.settings.pin,
            mutation: MutationOptions {
                mirror_all_group: self.settings.mirror_all_group,
            },
            sync_requirements: self.settings.sync_requirements,
            dry_run,
            environment: self.environment(),
            ..SyncOptions::default()
        }
    }

    /// Registry client for the configured index
    pub fn registry(&self) -> Result<InfoClient> {
        InfoClient::with_index_url(&self.settings.index_url, self.settings.requests_per_second)
            .with_context(|| format!("Invalid package index '{}'", self.settings.index_url))
    }
}
