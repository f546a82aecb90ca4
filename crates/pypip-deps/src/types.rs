//! Core types for manifest mutation

use crate::requirement::RequirementEntry;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A dependency list inside pyproject.toml
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SectionKey {
    /// `[project].dependencies`
    Dependencies,
    /// `[project.optional-dependencies].<group>`
    Optional(String),
    /// `[tool.hatch.envs.<env>].dependencies`
    HatchEnv(String),
}

impl SectionKey {
    /// Name of the optional group that mirrors every other group
    pub const ALL_GROUP: &'static str = "all";

    /// Resolve the section targeted by a `--dependency-group` / `--hatch-env` pair
    ///
    /// A hatch environment wins over the group, matching how the environment
    /// owns its own dependency list.
    pub fn select(group: &str, hatch_env: Option<&str>) -> Result<Self> {
        match hatch_env {
            Some(env) if !env.trim().is_empty() => Ok(Self::HatchEnv(env.trim().to_string())),
            _ => group.parse(),
        }
    }

    /// True for `optional-dependencies.all`
    pub fn is_all_group(&self) -> bool {
        matches!(self, Self::Optional(group) if group == Self::ALL_GROUP)
    }
}

impl FromStr for SectionKey {
    type Err = Error;

    /// Accepts `dependencies`, `optional-dependencies.<group>`, `hatch.<env>`,
    /// or a bare group name.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::Other("empty dependency section name".to_string()));
        }
        if s == "dependencies" {
            return Ok(Self::Dependencies);
        }
        if let Some(group) = s.strip_prefix("optional-dependencies.") {
            return Ok(Self::Optional(group.to_string()));
        }
        if let Some(env) = s.strip_prefix("hatch.") {
            return Ok(Self::HatchEnv(env.to_string()));
        }
        Ok(Self::Optional(s.to_string()))
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dependencies => write!(f, "dependencies"),
            Self::Optional(group) => write!(f, "optional-dependencies.{}", group),
            Self::HatchEnv(env) => write!(f, "hatch.{}", env),
        }
    }
}

/// One dependency list and its entries, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSection {
    /// Which list this is
    pub key: SectionKey,
    /// Parsed entries
    pub entries: Vec<RequirementEntry>,
}

impl ManifestSection {
    /// Find an entry by (normalized) name
    pub fn find(&self, name: &str) -> Option<&RequirementEntry> {
        self.entries.iter().find(|e| e.same_package(name))
    }
}

/// The diff produced by a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    /// Entries appended or written in place of an old one
    pub added: Vec<RequirementEntry>,
    /// Requirement strings removed, as they were written
    pub removed: Vec<String>,
    /// True when the mutation left the document as it was
    pub unchanged: bool,
}

impl Default for ChangeSet {
    fn default() -> Self {
        Self::unchanged()
    }
}

impl ChangeSet {
    /// A change set that records nothing
    pub fn unchanged() -> Self {
        Self {
            added: vec![],
            removed: vec![],
            unchanged: true,
        }
    }

    pub(crate) fn record_added(&mut self, entry: RequirementEntry) {
        self.added.push(entry);
        self.unchanged = false;
    }

    pub(crate) fn record_removed(&mut self, raw: impl Into<String>) {
        self.removed.push(raw.into());
        self.unchanged = false;
    }

    /// Fold another change set into this one
    pub fn merge(&mut self, other: ChangeSet) {
        self.added.extend(other.added);
        self.removed.extend(other.removed);
        self.unchanged = self.added.is_empty() && self.removed.is_empty();
    }
}
