//! # pypip-deps
//!
//! Format-preserving dependency management for Python projects.
//!
//! This crate provides functionality to:
//! - Parse pyproject.toml into a document that round-trips byte for byte
//! - Add and remove dependency entries idempotently, with name normalization
//! - Validate PEP 508 requirements and PEP 440 version specifiers
//! - Keep requirements.txt pins in step with pyproject.toml
//! - Run an installer and write files atomically only when it succeeds
//!
//! ## Architecture
//!
//! - [`ManifestDocument`] wraps a `toml_edit` document and only ever touches
//!   dependency arrays
//! - [`DependencyMutator`] applies add/remove operations and reports a [`ChangeSet`]
//! - [`ProjectSync`] drives an [`Installer`] and the mutator together
//!
//! ## Example
//!
//! ```rust
//! use pypip_deps::{ManifestDocument, SectionKey};
//!
//! # fn example() -> pypip_deps::Result<()> {
//! let mut doc = ManifestDocument::parse(
//!     "[project]\nname = \"demo\"\ndependencies = [\"requests>=2.0\"]\n",
//! )?;
//! let changes = pypip_deps::add(&mut doc, "requests", Some("==2.31.0"), &SectionKey::Dependencies)?;
//!
//! assert_eq!(changes.removed, vec!["requests>=2.0"]);
//! assert!(doc.to_string().contains("\"requests==2.31.0\""));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod mutator;
pub mod project;
pub mod requirement;
pub mod requirements_txt;
pub mod sync;
pub mod types;
pub mod update;
pub mod version;

// Re-export main types
pub use document::ManifestDocument;
pub use error::{Error, Result};
pub use mutator::{add, remove, DependencyMutator, MutationOptions};
pub use project::Project;
pub use requirement::{normalize_name, RequirementEntry};
pub use requirements_txt::RequirementsFile;
pub use sync::{
    InstallEnvironment, InstallMode, InstallOutcome, InstallRequest, Installer, PinStrategy,
    ProjectSync, SyncOptions, SyncReport,
};
pub use types::{ChangeSet, ManifestSection, SectionKey};
pub use update::FileUpdater;
pub use version::{latest_final, sort_versions, PyVersion, VersionSpecifier, VersionSpecifiers};
