//! Core domain types for package information

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Package information from PyPI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Package name as published
    pub name: String,
    /// Latest final release (falls back to PyPI's `info.version`)
    pub version: String,
    /// One-line summary
    pub summary: Option<String>,
    /// Long description
    pub description: Option<String>,
    /// MIME type of the description (`text/markdown`, `text/x-rst`, ...)
    pub description_content_type: Option<String>,
    /// License text or identifier
    pub license: Option<String>,
    /// `Requires-Python` constraint
    pub requires_python: Option<String>,
    /// Author name or email
    pub author: Option<String>,
    /// Homepage URL
    pub homepage: Option<String>,
    /// GitHub repository, when one of the project URLs points there
    pub repository: Option<RepositoryUrl>,
    /// Labelled project URLs
    pub project_urls: BTreeMap<String, String>,
    /// Upload time of the latest release files
    pub released_at: Option<DateTime<Utc>>,
    /// Number of published releases
    pub release_count: usize,
}

impl PackageInfo {
    /// True when the description is markdown
    pub fn has_markdown_description(&self) -> bool {
        self.description_content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("text/markdown"))
    }
}

/// Every published version of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersions {
    /// Package name as published
    pub name: String,
    /// Versions in ascending PEP 440 order
    pub versions: Vec<String>,
    /// One-line summary
    pub summary: Option<String>,
}

impl PackageVersions {
    /// Highest final release, if any
    pub fn latest(&self) -> Option<&str> {
        pypip_deps::latest_final(self.versions.iter().map(String::as_str))
    }
}

/// One row of a registry search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Package name
    pub name: String,
    /// Latest version shown by the registry
    pub version: String,
    /// Short description
    pub description: String,
    /// When the shown version was released
    pub released_at: Option<DateTime<Utc>>,
}

/// Parsed repository URL information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryUrl {
    /// Repository owner/organization
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Full repository URL
    pub url: String,
}

impl RepositoryUrl {
    /// Create a new RepositoryUrl
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            url: url.into(),
        }
    }
}
