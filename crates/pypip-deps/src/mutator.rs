//! Idempotent add/remove of dependency entries
//!
//! Every operation validates its input and the target section before the
//! first node is touched, so a failed mutation leaves the document exactly as
//! it was.

use crate::document::{push_formatted, remove_formatted, ManifestDocument};
use crate::requirement::RequirementEntry;
use crate::types::{ChangeSet, SectionKey};
use crate::Result;

/// Knobs for [`DependencyMutator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOptions {
    /// Mirror edits of an optional group into `optional-dependencies.all`
    pub mirror_all_group: bool,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            mirror_all_group: true,
        }
    }
}

/// Applies add/remove operations to a [`ManifestDocument`]
#[derive(Debug, Clone, Default)]
pub struct DependencyMutator {
    options: MutationOptions,
}

impl DependencyMutator {
    /// Create a mutator with the given options
    pub fn new(options: MutationOptions) -> Self {
        Self { options }
    }

    /// Add or replace a requirement
    ///
    /// `requirement` may be a bare name or a full requirement string
    /// (`pkg[extra]>=1; marker`). An explicit `version_constraint` overrides
    /// any constraint carried by `requirement`.
    ///
    /// # Errors
    /// `InvalidRequirement`, `InvalidVersionSpecifier` or `HatchEnvUnavailable`;
    /// the document is untouched in every error case.
    pub fn add(
        &self,
        doc: &mut ManifestDocument,
        requirement: &str,
        version_constraint: Option<&str>,
        section: &SectionKey,
    ) -> Result<ChangeSet> {
        let mut entry = RequirementEntry::parse(requirement)?;
        if let Some(constraint) = version_constraint {
            entry = entry.with_constraint(constraint)?;
        }
        self.add_entry(doc, &entry, section)
    }

    /// Add or replace an already validated entry
    pub fn add_entry(
        &self,
        doc: &mut ManifestDocument,
        entry: &RequirementEntry,
        section: &SectionKey,
    ) -> Result<ChangeSet> {
        let targets = self.targets(section);
        for target in &targets {
            doc.ensure_available(target)?;
        }

        let mut changes = ChangeSet::unchanged();
        for target in &targets {
            changes.merge(add_to_section(doc, entry, target)?);
        }
        Ok(changes)
    }

    /// Remove every entry naming the package
    ///
    /// `name` may carry extras or a version (`pkg[extra]==1.0`); only the
    /// normalized name is used. Removing an absent package is a no-op.
    pub fn remove(
        &self,
        doc: &mut ManifestDocument,
        name: &str,
        section: &SectionKey,
    ) -> Result<ChangeSet> {
        let normalized = RequirementEntry::parse(name)?.normalized_name();
        let targets = self.targets(section);
        for target in &targets {
            doc.ensure_available(target)?;
        }

        let mut changes = ChangeSet::unchanged();
        for target in &targets {
            changes.merge(remove_from_section(doc, &normalized, target)?);
        }
        Ok(changes)
    }

    fn targets(&self, section: &SectionKey) -> Vec<SectionKey> {
        let mut targets = vec![section.clone()];
        if self.options.mirror_all_group
            && matches!(section, SectionKey::Optional(_))
            && !section.is_all_group()
        {
            targets.push(SectionKey::Optional(SectionKey::ALL_GROUP.to_string()));
        }
        targets
    }
}

/// Add to a single section, without `all`-group mirroring
pub fn add(
    doc: &mut ManifestDocument,
    name: &str,
    version_constraint: Option<&str>,
    section: &SectionKey,
) -> Result<ChangeSet> {
    DependencyMutator::new(MutationOptions {
        mirror_all_group: false,
    })
    .add(doc, name, version_constraint, section)
}

/// Remove from a single section, without `all`-group mirroring
pub fn remove(doc: &mut ManifestDocument, name: &str, section: &SectionKey) -> Result<ChangeSet> {
    DependencyMutator::new(MutationOptions {
        mirror_all_group: false,
    })
    .remove(doc, name, section)
}

// Indices and raw strings of the entries matching a normalized name
fn matching_entries(array: &toml_edit::Array, normalized: &str) -> Vec<(usize, String)> {
    array
        .iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let raw = value.as_str()?;
            let entry = RequirementEntry::parse(raw).ok()?;
            (entry.normalized_name() == normalized).then(|| (index, raw.to_string()))
        })
        .collect()
}

fn add_to_section(
    doc: &mut ManifestDocument,
    entry: &RequirementEntry,
    section: &SectionKey,
) -> Result<ChangeSet> {
    let array = doc.array_mut(section)?;
    let matches = matching_entries(array, &entry.normalized_name());
    let mut changes = ChangeSet::unchanged();

    let Some(((first, existing), duplicates)) = matches.split_first() else {
        let rendered = entry.to_string();
        push_formatted(array, &rendered);
        changes.record_added(entry.clone());
        tracing::debug!(%section, requirement = %rendered, "appended requirement");
        return Ok(changes);
    };

    // Only the parts the caller named change; an equal merge keeps the node
    let current = RequirementEntry::parse(existing)?;
    let merged = current.merged_with(entry);
    if merged != current {
        let rendered = merged.to_string();
        array.replace(*first, rendered.as_str());
        changes.record_removed(existing.clone());
        tracing::debug!(%section, old = %existing, new = %rendered, "replaced requirement");
        changes.record_added(merged);
    }

    for (_, raw) in duplicates {
        changes.record_removed(raw.clone());
    }
    for (index, raw) in duplicates.iter().rev() {
        remove_formatted(array, *index);
        tracing::debug!(%section, requirement = %raw, "dropped duplicate requirement");
    }

    Ok(changes)
}

fn remove_from_section(
    doc: &mut ManifestDocument,
    normalized: &str,
    section: &SectionKey,
) -> Result<ChangeSet> {
    let mut changes = ChangeSet::unchanged();
    let has_matches = doc
        .array(section)
        .is_some_and(|array| !matching_entries(array, normalized).is_empty());
    if !has_matches {
        return Ok(changes);
    }

    let array = doc.array_mut(section)?;
    let matches = matching_entries(array, normalized);
    for (_, raw) in &matches {
        changes.record_removed(raw.clone());
    }
    for (index, raw) in matches.iter().rev() {
        remove_formatted(array, *index);
        tracing::debug!(%section, requirement = %raw, "removed requirement");
    }
    Ok(changes)
}
