//! Python project discovery

use crate::document::ManifestDocument;
use crate::requirements_txt::RequirementsFile;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Manifest file name
pub const MANIFEST_FILE: &str = "pyproject.toml";

/// Default requirements file name
pub const DEFAULT_REQUIREMENTS_FILE: &str = "requirements.txt";

/// A directory holding a pyproject.toml
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root: PathBuf,
    requirements_file: PathBuf,
}

impl Project {
    /// Find the project containing `start`
    ///
    /// Walks up the directory tree to the first directory with a pyproject.toml.
    pub fn discover(start: &Path) -> Result<Self> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(MANIFEST_FILE).is_file() {
                tracing::debug!(root = %current.display(), "found project");
                return Ok(Self::new(current));
            }
            if !current.pop() {
                break;
            }
        }

        Err(Error::ProjectNotFound(start.to_path_buf()))
    }

    /// Use `root` as the project directory without searching
    pub fn at(root: &Path) -> Result<Self> {
        if root.join(MANIFEST_FILE).is_file() {
            Ok(Self::new(root.to_path_buf()))
        } else {
            Err(Error::ProjectNotFound(root.to_path_buf()))
        }
    }

    fn new(root: PathBuf) -> Self {
        Self {
            requirements_file: PathBuf::from(DEFAULT_REQUIREMENTS_FILE),
            root,
        }
    }

    /// Use a different requirements file, relative to the root unless absolute
    pub fn with_requirements_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.requirements_file = file.into();
        self
    }

    /// Project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to pyproject.toml
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Path to the requirements file (which may not exist)
    pub fn requirements_path(&self) -> PathBuf {
        self.root.join(&self.requirements_file)
    }

    /// Load and validate pyproject.toml
    pub fn load_manifest(&self) -> Result<ManifestDocument> {
        ManifestDocument::load(&self.manifest_path())
    }

    /// Load the requirements file if present
    pub fn load_requirements(&self) -> Result<Option<RequirementsFile>> {
        let path = self.requirements_path();
        if !path.is_file() {
            return Ok(None);
        }
        RequirementsFile::load(&path).map(Some)
    }
}
