//! PEP 508 requirement strings (`name[extras] specifier ; marker`)

use crate::version::VersionSpecifiers;
use crate::{Error, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?")
            .expect("package name pattern is valid")
    })
}

fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-_.]+").expect("separator pattern is valid"))
}

/// Normalize a package name for comparison
///
/// Lowercases and folds runs of `-`, `_` and `.` into a single `-`, so
/// `My_Pkg`, `my.pkg` and `my-pkg` compare equal.
pub fn normalize_name(name: &str) -> String {
    separator_regex()
        .replace_all(&name.trim().to_ascii_lowercase(), "-")
        .into_owned()
}

/// One dependency declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementEntry {
    /// Package name as written
    pub name: String,
    /// Normalized version constraint (e.g. `>=2.0,<3`), if any
    pub version_constraint: Option<String>,
    /// Normalized extras
    pub extras: BTreeSet<String>,
    /// Environment marker text after `;`
    pub marker: Option<String>,
    /// Direct reference after `@`
    pub url: Option<String>,
}

impl RequirementEntry {
    /// Create an entry with just a name
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let entry = Self::parse(&name)?;
        let bare = entry.version_constraint.is_none()
            && entry.url.is_none()
            && entry.marker.is_none()
            && entry.extras.is_empty();
        if !bare {
            return Err(Error::InvalidRequirement(
                name,
                "expected a bare package name".to_string(),
            ));
        }
        Ok(entry)
    }

    /// Parse a requirement string
    ///
    /// # Errors
    /// `InvalidRequirement` for a bad name, extras or URL;
    /// `InvalidVersionSpecifier` for a bad version constraint.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidRequirement(input.to_string(), reason.to_string());

        let (head, marker) = match input.split_once(';') {
            Some((head, marker)) => {
                let marker = marker.trim();
                if marker.is_empty() {
                    return Err(invalid("empty environment marker"));
                }
                (head.trim(), Some(marker.to_string()))
            }
            None => (input.trim(), None),
        };

        let name_match = name_regex()
            .find(head)
            .ok_or_else(|| invalid("missing or invalid package name"))?;
        let name = name_match.as_str().to_string();
        let mut rest = head[name_match.end()..].trim_start();

        let mut extras = BTreeSet::new();
        if let Some(after) = rest.strip_prefix('[') {
            let (inner, tail) = after
                .split_once(']')
                .ok_or_else(|| invalid("unterminated extras"))?;
            for extra in inner.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                let valid = name_regex().find(extra).is_some_and(|m| m.end() == extra.len());
                if !valid {
                    return Err(invalid(&format!("invalid extra '{}'", extra)));
                }
                extras.insert(normalize_name(extra));
            }
            rest = tail.trim_start();
        }

        let mut version_constraint = None;
        let mut url = None;
        if let Some(reference) = rest.strip_prefix('@') {
            let reference = reference.trim();
            if reference.is_empty() || reference.chars().any(char::is_whitespace) {
                return Err(invalid("invalid direct reference"));
            }
            url = Some(reference.to_string());
        } else if !rest.is_empty() {
            let spec = rest
                .strip_prefix('(')
                .and_then(|s| s.strip_suffix(')'))
                .unwrap_or(rest);
            if !spec.trim_start().starts_with(['<', '>', '=', '!', '~']) {
                return Err(invalid(&format!("unexpected '{}' after package name", rest)));
            }
            version_constraint = Some(VersionSpecifiers::parse(spec)?.to_string());
        }

        Ok(Self {
            name,
            version_constraint,
            extras,
            marker,
            url,
        })
    }

    /// Normalized package name used for every comparison
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// True when `other` names the same package
    pub fn same_package(&self, other: &str) -> bool {
        self.normalized_name() == normalize_name(other)
    }

    /// Replace the version constraint with a validated one
    ///
    /// A bare version such as `1.0` becomes `==1.0`.
    pub fn with_constraint(mut self, constraint: &str) -> Result<Self> {
        if self.url.is_some() {
            return Err(Error::InvalidRequirement(
                self.to_string(),
                "a direct reference cannot also carry a version constraint".to_string(),
            ));
        }
        self.version_constraint = Some(VersionSpecifiers::parse(constraint)?.to_string());
        Ok(self)
    }

    /// Fold a later declaration of the same package into this one
    ///
    /// The version constraint or direct reference comes from `update` when it
    /// carries one. Extras and marker are kept unless `update` names its own,
    /// and the name keeps its recorded spelling.
    pub fn merged_with(&self, update: &RequirementEntry) -> RequirementEntry {
        let mut merged = self.clone();
        if update.url.is_some() {
            merged.url = update.url.clone();
            merged.version_constraint = None;
        } else if update.version_constraint.is_some() {
            merged.version_constraint = update.version_constraint.clone();
            merged.url = None;
        }
        if !update.extras.is_empty() {
            merged.extras = update.extras.clone();
        }
        if update.marker.is_some() {
            merged.marker = update.marker.clone();
        }
        merged
    }
}

impl fmt::Display for RequirementEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(String::as_str).collect();
            write!(f, "[{}]", extras.join(","))?;
        }
        if let Some(url) = &self.url {
            write!(f, " @ {}", url)?;
            if let Some(marker) = &self.marker {
                write!(f, " ; {}", marker)?;
            }
            return Ok(());
        }
        if let Some(constraint) = &self.version_constraint {
            write!(f, "{}", constraint)?;
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {}", marker)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("My-Pkg"), "my-pkg");
        assert_eq!(normalize_name("my_pkg"), "my-pkg");
        assert_eq!(normalize_name("My.__Pkg"), "my-pkg");
        assert_eq!(normalize_name("requests"), "requests");
    }

    #[test]
    fn test_parse_plain_name() {
        let entry = RequirementEntry::parse("requests").unwrap();
        assert_eq!(entry.name, "requests");
        assert_eq!(entry.version_constraint, None);
        assert!(entry.extras.is_empty());
        assert_eq!(entry.to_string(), "requests");
    }

    #[test]
    fn test_parse_full_requirement() {
        let entry =
            RequirementEntry::parse("Uvicorn[Standard, watch] >= 0.20 , <1 ; python_version < \"3.12\"")
                .unwrap();
        assert_eq!(entry.name, "Uvicorn");
        assert_eq!(entry.extras.iter().cloned().collect::<Vec<_>>(), vec!["standard", "watch"]);
        assert_eq!(entry.version_constraint.as_deref(), Some(">=0.20,<1"));
        assert_eq!(entry.marker.as_deref(), Some("python_version < \"3.12\""));
        assert_eq!(
            entry.to_string(),
            "Uvicorn[standard,watch]>=0.20,<1; python_version < \"3.12\""
        );
    }

    #[test]
    fn test_parse_parenthesized_specifier() {
        let entry = RequirementEntry::parse("numpy (>=1.26)").unwrap();
        assert_eq!(entry.version_constraint.as_deref(), Some(">=1.26"));
    }

    #[test]
    fn test_parse_direct_reference() {
        let entry = RequirementEntry::parse("pkg @ https://example.com/pkg-1.0.tar.gz").unwrap();
        assert_eq!(entry.url.as_deref(), Some("https://example.com/pkg-1.0.tar.gz"));
        assert_eq!(entry.to_string(), "pkg @ https://example.com/pkg-1.0.tar.gz");
        assert!(entry.with_constraint("==1.0").is_err());
    }

    #[test]
    fn test_invalid_requirements() {
        assert!(matches!(
            RequirementEntry::parse("-e ."),
            Err(Error::InvalidRequirement(_, _))
        ));
        assert!(matches!(
            RequirementEntry::parse("pkg[extra"),
            Err(Error::InvalidRequirement(_, _))
        ));
        assert!(matches!(
            RequirementEntry::parse("pkg junk"),
            Err(Error::InvalidRequirement(_, _))
        ));
        assert!(matches!(
            RequirementEntry::parse("pkg>=not.a.version"),
            Err(Error::InvalidVersionSpecifier(_, _))
        ));
    }

    #[test]
    fn test_with_constraint() {
        let entry = RequirementEntry::parse("My-Pkg").unwrap().with_constraint("1.0").unwrap();
        assert_eq!(entry.to_string(), "My-Pkg==1.0");
        assert!(entry.same_package("my_pkg"));

        let err = RequirementEntry::parse("pkg").unwrap().with_constraint(">>1").unwrap_err();
        assert!(matches!(err, Error::InvalidVersionSpecifier(_, _)));
    }

    #[test]
    fn test_merge_keeps_extras_and_marker() {
        let existing =
            RequirementEntry::parse("uvicorn[standard]>=0.20; python_version >= '3.8'").unwrap();
        let merged = existing.merged_with(&RequirementEntry::parse("Uvicorn==0.30.0").unwrap());
        assert_eq!(merged.to_string(), "uvicorn[standard]==0.30.0; python_version >= '3.8'");

        let merged = existing.merged_with(&RequirementEntry::parse("uvicorn[watch]; os_name == 'nt'").unwrap());
        assert_eq!(merged.to_string(), "uvicorn[watch]>=0.20; os_name == 'nt'");

        let merged = existing.merged_with(&RequirementEntry::parse("uvicorn @ https://example.com/u.whl").unwrap());
        assert_eq!(merged.version_constraint, None);
        assert_eq!(merged.url.as_deref(), Some("https://example.com/u.whl"));
    }

    #[test]
    fn test_merge_bare_name_keeps_constraint() {
        let existing = RequirementEntry::parse("requests >= 2.0").unwrap();
        let merged = existing.merged_with(&RequirementEntry::parse("requests").unwrap());
        assert_eq!(merged, existing);
    }

    #[test]
    fn test_new_rejects_specifiers() {
        assert!(RequirementEntry::new("requests").is_ok());
        assert!(RequirementEntry::new("requests==1.0").is_err());
    }
}
