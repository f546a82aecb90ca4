//! Keep pyproject.toml (and requirements.txt) in step with pip
//!
//! The flow for every command is the same: validate everything in memory,
//! run the installer, and only write files once it reported success.

use crate::document::ManifestDocument;
use crate::mutator::{DependencyMutator, MutationOptions};
use crate::project::Project;
use crate::requirement::RequirementEntry;
use crate::types::{ChangeSet, SectionKey};
use crate::update::FileUpdater;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// What the installer is asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// `pip install`
    Install,
    /// `pip uninstall`
    Uninstall,
}

/// Interpreter and optional hatch environment to run pip in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallEnvironment {
    /// Python interpreter used when no hatch environment is selected
    pub python: String,
    /// Hatch environment name
    pub hatch_env: Option<String>,
}

impl InstallEnvironment {
    /// Plain interpreter environment
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
            hatch_env: None,
        }
    }

    /// Run inside a hatch environment
    pub fn with_hatch_env(mut self, env: Option<String>) -> Self {
        self.hatch_env = env;
        self
    }
}

impl Default for InstallEnvironment {
    fn default() -> Self {
        Self::new("python3")
    }
}

/// A single installer invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// Install or uninstall
    pub mode: InstallMode,
    /// Specs exactly as the user gave them
    pub specifiers: Vec<String>,
    /// `--upgrade`
    pub upgrade: bool,
    /// `--editable`
    pub editable: bool,
    /// Where to run
    pub environment: InstallEnvironment,
}

/// Result of running the installer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Process exit code
    pub exit_code: i32,
    /// Standard output, already echoed to the terminal
    pub stdout: String,
    /// Standard error, already echoed to the terminal
    pub stderr: String,
}

impl InstallOutcome {
    /// True for exit code 0
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// The package installer seam
pub trait Installer {
    /// Run pip (or an equivalent)
    fn run(&self, request: &InstallRequest) -> Result<InstallOutcome>;

    /// Version of `name` installed in `environment`, if any
    fn installed_version(&self, name: &str, environment: &InstallEnvironment) -> Result<Option<String>>;
}

/// How an unversioned install is recorded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PinStrategy {
    /// `name==installed`
    #[default]
    Exact,
    /// `name>=installed`
    LowerBound,
    /// Bare `name`
    None,
}

impl PinStrategy {
    /// Constraint to record for an installed version
    pub fn constraint(&self, version: &str) -> Option<String> {
        match self {
            Self::Exact => Some(format!("=={}", version)),
            Self::LowerBound => Some(format!(">={}", version)),
            Self::None => None,
        }
    }
}

impl FromStr for PinStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exact" => Ok(Self::Exact),
            "lower-bound" => Ok(Self::LowerBound),
            "none" => Ok(Self::None),
            other => Err(Error::Other(format!(
                "unknown pin strategy '{}' (expected exact, lower-bound or none)",
                other
            ))),
        }
    }
}

impl fmt::Display for PinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exact => "exact",
            Self::LowerBound => "lower-bound",
            Self::None => "none",
        })
    }
}

/// Options shared by install and uninstall
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Dependency list to edit
    pub section: SectionKey,
    /// Pin strategy for unversioned installs
    pub pin: PinStrategy,
    /// Mutator knobs
    pub mutation: MutationOptions,
    /// Also maintain requirements.txt when it exists
    pub sync_requirements: bool,
    /// Pass `--upgrade` to pip
    pub upgrade: bool,
    /// Pass `--editable` to pip
    pub editable: bool,
    /// Skip the installer and every write
    pub dry_run: bool,
    /// Interpreter / hatch environment
    pub environment: InstallEnvironment,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            section: SectionKey::Dependencies,
            pin: PinStrategy::default(),
            mutation: MutationOptions::default(),
            sync_requirements: true,
            upgrade: false,
            editable: false,
            dry_run: false,
            environment: InstallEnvironment::default(),
        }
    }
}

/// What a sync did
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// pyproject.toml changes
    pub manifest: ChangeSet,
    /// requirements.txt changes, when the file was considered
    pub requirements: Option<ChangeSet>,
    /// Installer outcome (None on dry run)
    pub outcome: Option<InstallOutcome>,
    /// Files actually written
    pub written: Vec<PathBuf>,
}

/// Runs the installer and records the result in the project files
pub struct ProjectSync<I> {
    project: Project,
    installer: I,
}

impl<I: Installer> ProjectSync<I> {
    /// Create a sync for a project
    pub fn new(project: Project, installer: I) -> Self {
        Self { project, installer }
    }

    /// The project being synced
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Install packages and record them
    ///
    /// # Errors
    /// Any invalid spec, malformed manifest or unavailable hatch environment
    /// fails before pip runs. A non-zero pip exit yields `InstallerFailed`
    /// and nothing is written.
    pub fn install(&self, specs: &[String], options: &SyncOptions) -> Result<SyncReport> {
        let mut doc = self.project.load_manifest()?;
        let mutator = DependencyMutator::new(options.mutation);

        let mut entries = Vec::with_capacity(specs.len());
        for spec in specs {
            match RequirementEntry::parse(spec) {
                Ok(entry) => entries.push(entry),
                // Local paths and VCS URLs are fine for `pip install -e`
                Err(err) if options.editable => {
                    tracing::debug!(spec = %spec, error = %err, "not recording editable spec");
                }
                Err(err) => return Err(err),
            }
        }

        let mut preview = doc.clone();
        let mut planned = ChangeSet::unchanged();
        for entry in &entries {
            planned.merge(mutator.add_entry(&mut preview, entry, &options.section)?);
        }

        if options.dry_run {
            return Ok(SyncReport {
                manifest: planned,
                ..SyncReport::default()
            });
        }

        let outcome = self.run_installer(InstallMode::Install, specs, options)?;

        let mut manifest_changes = ChangeSet::unchanged();
        let mut pins = Vec::with_capacity(entries.len());
        for entry in entries {
            let installed = if entry.url.is_none() {
                self.installer.installed_version(&entry.name, &options.environment)?
            } else {
                None
            };
            let recorded = pinned_entry(entry, installed.as_deref(), options.pin);
            manifest_changes.merge(mutator.add_entry(&mut doc, &recorded, &options.section)?);
            if let Some(version) = installed {
                pins.push((recorded, version));
            }
        }

        let mut report = SyncReport {
            manifest: manifest_changes,
            outcome: Some(outcome),
            ..SyncReport::default()
        };

        let requirements = if options.sync_requirements {
            self.project.load_requirements()?
        } else {
            None
        };
        let requirements = match requirements {
            Some(mut file) => {
                let mut changes = ChangeSet::unchanged();
                for (entry, version) in &pins {
                    changes.merge(file.pin(&requirement_key(entry), version)?);
                }
                report.requirements = Some(changes);
                Some(file)
            }
            None => None,
        };

        self.write(&doc, requirements.map(|f| f.to_string()), &mut report)?;
        Ok(report)
    }

    /// Uninstall packages and drop them from the project files
    pub fn uninstall(&self, names: &[String], options: &SyncOptions) -> Result<SyncReport> {
        let mut doc = self.project.load_manifest()?;
        let mutator = DependencyMutator::new(options.mutation);

        // Validate every name and the target section before pip runs
        let mut preview = doc.clone();
        let mut planned = ChangeSet::unchanged();
        for name in names {
            planned.merge(mutator.remove(&mut preview, name, &options.section)?);
        }

        if options.dry_run {
            return Ok(SyncReport {
                manifest: planned,
                ..SyncReport::default()
            });
        }

        let outcome = self.run_installer(InstallMode::Uninstall, names, options)?;

        let mut manifest_changes = ChangeSet::unchanged();
        for name in names {
            manifest_changes.merge(mutator.remove(&mut doc, name, &options.section)?);
        }

        let mut report = SyncReport {
            manifest: manifest_changes,
            outcome: Some(outcome),
            ..SyncReport::default()
        };

        let mut requirements = if options.sync_requirements {
            self.project.load_requirements()?
        } else {
            None
        };
        if let Some(file) = requirements.as_mut() {
            let mut changes = ChangeSet::unchanged();
            for name in names {
                changes.merge(file.unpin(name));
            }
            report.requirements = Some(changes);
        }

        self.write(&doc, requirements.map(|f| f.to_string()), &mut report)?;
        Ok(report)
    }

    fn run_installer(
        &self,
        mode: InstallMode,
        specifiers: &[String],
        options: &SyncOptions,
    ) -> Result<InstallOutcome> {
        let request = InstallRequest {
            mode,
            specifiers: specifiers.to_vec(),
            upgrade: options.upgrade,
            editable: options.editable,
            environment: options.environment.clone(),
        };
        tracing::debug!(?request, "running installer");

        let outcome = self.installer.run(&request)?;
        if !outcome.success() {
            return Err(Error::InstallerFailed {
                code: outcome.exit_code,
                stderr: outcome.stderr,
            });
        }
        Ok(outcome)
    }

    fn write(
        &self,
        doc: &ManifestDocument,
        requirements: Option<String>,
        report: &mut SyncReport,
    ) -> Result<()> {
        let mut updater = FileUpdater::new();
        let mut written = Vec::new();

        if !report.manifest.unchanged {
            let path = self.project.manifest_path();
            updater.stage(&path, &doc.to_string())?;
            written.push(path);
        }

        let requirements_changed = report.requirements.as_ref().is_some_and(|c| !c.unchanged);
        if let (Some(contents), true) = (requirements, requirements_changed) {
            let path = self.project.requirements_path();
            updater.stage(&path, &contents)?;
            written.push(path);
        }

        updater.commit()?;
        report.written.extend(written);
        Ok(())
    }
}

// Apply the pin strategy to an entry without an explicit constraint
fn pinned_entry(entry: RequirementEntry, installed: Option<&str>, pin: PinStrategy) -> RequirementEntry {
    if entry.version_constraint.is_some() || entry.url.is_some() {
        return entry;
    }
    let Some(constraint) = installed.and_then(|version| pin.constraint(version)) else {
        return entry;
    };
    match entry.clone().with_constraint(&constraint) {
        Ok(pinned) => pinned,
        Err(err) => {
            tracing::warn!(package = %entry.name, error = %err, "installed version is not PEP 440, recording unpinned");
            entry
        }
    }
}

// `name[extras]` used as the requirements.txt key
fn requirement_key(entry: &RequirementEntry) -> String {
    if entry.extras.is_empty() {
        entry.name.clone()
    } else {
        let extras: Vec<&str> = entry.extras.iter().map(String::as_str).collect();
        format!("{}[{}]", entry.name, extras.join(","))
    }
}
