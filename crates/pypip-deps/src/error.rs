//! Error types for pypip-deps

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using pypip-deps Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pypip-deps
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest is not valid TOML or does not have the expected shape
    #[error("Malformed pyproject.toml: {0}")]
    MalformedConfig(String),

    /// A version constraint could not be parsed
    #[error("Invalid version specifier '{0}': {1}")]
    InvalidVersionSpecifier(String, String),

    /// A requirement string could not be parsed
    #[error("Invalid requirement '{0}': {1}")]
    InvalidRequirement(String, String),

    /// A hatch environment was selected but the manifest has no `[tool.hatch]` table
    #[error("Hatch environment '{0}' requested but [tool.hatch] is missing from pyproject.toml")]
    HatchEnvUnavailable(String),

    /// No pyproject.toml found walking up from the start directory
    #[error("No pyproject.toml found in {0} or any parent directory")]
    ProjectNotFound(PathBuf),

    /// The package installer exited with a non-zero status
    #[error("Package installer failed with exit code {code}")]
    InstallerFailed {
        /// Exit code reported by the installer process
        code: i32,
        /// Captured standard error, if any
        stderr: String,
    },

    /// The package installer could not be started
    #[error("Failed to run package installer: {0}")]
    Installer(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a malformed-config error from anything displayable
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedConfig(msg.into())
    }
}
