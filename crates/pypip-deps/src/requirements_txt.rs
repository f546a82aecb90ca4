//! requirements.txt reading and pinning
//!
//! Only requirement lines are ever rewritten. Comments, blank lines and pip
//! options (`-r other.txt`, `-e .`, `--index-url ...`) are kept verbatim.

use crate::requirement::{normalize_name, RequirementEntry};
use crate::types::ChangeSet;
use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Requirement {
        entry: RequirementEntry,
        raw: String,
        // Inline comment including the whitespace before `#`
        comment: Option<String>,
    },
    Verbatim(String),
}

impl Line {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('-') {
            return Self::Verbatim(raw.to_string());
        }

        let (body, comment) = match raw.find(" #").or_else(|| raw.find("\t#")) {
            Some(idx) => (&raw[..idx], Some(raw[idx..].to_string())),
            None => (raw, None),
        };

        match RequirementEntry::parse(body) {
            Ok(entry) => Self::Requirement {
                entry,
                raw: raw.to_string(),
                comment,
            },
            Err(err) => {
                tracing::debug!(line = %raw, error = %err, "keeping unparseable requirements line as-is");
                Self::Verbatim(raw.to_string())
            }
        }
    }

    fn matches(&self, normalized: &str) -> bool {
        matches!(self, Self::Requirement { entry, .. } if entry.normalized_name() == normalized)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requirement { raw, .. } | Self::Verbatim(raw) => f.write_str(raw),
        }
    }
}

/// A requirements.txt file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementsFile {
    lines: Vec<Line>,
    trailing_newline: bool,
    path: Option<PathBuf>,
}

impl RequirementsFile {
    /// Parse requirements text
    pub fn parse(text: &str) -> Self {
        let trailing_newline = text.is_empty() || text.ends_with('\n');
        let lines = text.lines().map(Line::parse).collect();
        Self {
            lines,
            trailing_newline,
            path: None,
        }
    }

    /// Read and parse a requirements file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut file = Self::parse(&text);
        file.path = Some(path.to_path_buf());
        Ok(file)
    }

    /// Path the file was loaded from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Requirement entries in file order
    pub fn entries(&self) -> impl Iterator<Item = &RequirementEntry> {
        self.lines.iter().filter_map(|line| match line {
            Line::Requirement { entry, .. } => Some(entry),
            Line::Verbatim(_) => None,
        })
    }

    /// Package specs suitable for passing to pip, without comments or options
    pub fn package_specs(&self) -> Vec<String> {
        self.entries().map(ToString::to_string).collect()
    }

    /// Pin a package to an exact version
    ///
    /// `name` may carry extras (`uvicorn[standard]`). The first line naming
    /// the package is rewritten in place and keeps its inline comment; later
    /// duplicates are dropped. When no line names the package, one is appended.
    pub fn pin(&mut self, name: &str, version: &str) -> Result<ChangeSet> {
        let entry = RequirementEntry::parse(name)?;
        if entry.url.is_some() {
            return Err(Error::InvalidRequirement(
                name.to_string(),
                "cannot pin a direct reference".to_string(),
            ));
        }
        let entry = entry.with_constraint(&format!("=={}", version))?;
        let normalized = entry.normalized_name();
        let rendered = entry.to_string();
        let mut changes = ChangeSet::unchanged();

        let mut matches = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.matches(&normalized))
            .map(|(idx, _)| idx);

        let Some(first) = matches.next() else {
            self.lines.push(Line::Requirement {
                entry: entry.clone(),
                raw: rendered,
                comment: None,
            });
            changes.record_added(entry);
            return Ok(changes);
        };
        let duplicates: Vec<usize> = matches.collect();

        if let Line::Requirement {
            entry: current,
            raw,
            comment,
        } = &mut self.lines[first]
        {
            let new_raw = format!("{}{}", rendered, comment.as_deref().unwrap_or(""));
            if *raw != new_raw {
                changes.record_removed(std::mem::replace(raw, new_raw));
                changes.record_added(entry.clone());
            }
            *current = entry;
        }

        for idx in duplicates.into_iter().rev() {
            let removed = self.lines.remove(idx);
            changes.record_removed(removed.to_string());
        }

        Ok(changes)
    }

    /// Delete every line naming the package
    pub fn unpin(&mut self, name: &str) -> ChangeSet {
        let normalized = match RequirementEntry::parse(name) {
            Ok(entry) => entry.normalized_name(),
            Err(_) => normalize_name(name),
        };
        let mut changes = ChangeSet::unchanged();
        self.lines.retain(|line| {
            if line.matches(&normalized) {
                changes.record_removed(line.to_string());
                false
            } else {
                true
            }
        });
        changes
    }
}

impl fmt::Display for RequirementsFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", line)?;
        }
        if self.trailing_newline && !self.lines.is_empty() {
            f.write_str("\n")?;
        }
        Ok(())
    }
}
