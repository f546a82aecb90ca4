//! pyproject.toml document model using toml_edit for comment/format preservation
//!
//! Only the dependency arrays are ever edited. Every other table, comment and
//! blank line is carried through byte for byte, so serializing an untouched
//! document reproduces the input exactly.

use crate::requirement::RequirementEntry;
use crate::types::{ManifestSection, SectionKey};
use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use toml_edit::{Array, DocumentMut, InlineTable, Item, RawString, Table, Value};

/// A parsed pyproject.toml
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    doc: DocumentMut,
    path: Option<PathBuf>,
}

impl ManifestDocument {
    /// Parse manifest text
    ///
    /// # Errors
    /// `MalformedConfig` if the text is not TOML, has no `[project]` table,
    /// or holds a dependency list that is not an array of valid requirements.
    pub fn parse(raw: &str) -> Result<Self> {
        let doc = raw
            .parse::<DocumentMut>()
            .map_err(|e| Error::malformed(e.to_string().trim_end().to_string()))?;

        match doc.get("project") {
            Some(item) if item.is_table_like() => {}
            Some(_) => return Err(Error::malformed("[project] must be a table")),
            None => return Err(Error::malformed("missing [project] table")),
        }

        let manifest = Self { doc, path: None };
        // Validate every dependency list up front so later edits can rely on it
        let sections = manifest.sections()?;
        tracing::debug!(sections = sections.len(), "parsed pyproject.toml");
        Ok(manifest)
    }

    /// Read and parse a manifest from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut manifest = Self::parse(&content).map_err(|e| match e {
            Error::MalformedConfig(msg) => {
                Error::MalformedConfig(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        manifest.path = Some(path.to_path_buf());
        Ok(manifest)
    }

    /// Path the document was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// `[project].name`
    pub fn project_name(&self) -> Option<&str> {
        self.doc
            .get("project")
            .and_then(|p| p.get("name"))
            .and_then(Item::as_str)
    }

    /// True when the manifest has a `[tool.hatch]` table
    pub fn has_hatch(&self) -> bool {
        self.doc
            .get("tool")
            .and_then(|t| t.get("hatch"))
            .is_some_and(Item::is_table_like)
    }

    /// Every dependency list in document order
    ///
    /// Order: `[project].dependencies`, then each optional group, then each
    /// hatch environment that declares dependencies.
    pub fn sections(&self) -> Result<Vec<ManifestSection>> {
        let mut sections = Vec::new();

        if let Some(item) = self.section_item(&SectionKey::Dependencies) {
            sections.push(read_section(SectionKey::Dependencies, item)?);
        }

        if let Some(groups) = self
            .doc
            .get("project")
            .and_then(|p| p.get("optional-dependencies"))
        {
            let groups = groups
                .as_table_like()
                .ok_or_else(|| Error::malformed("[project.optional-dependencies] must be a table"))?;
            for (group, item) in groups.iter() {
                sections.push(read_section(SectionKey::Optional(group.to_string()), item)?);
            }
        }

        if let Some(envs) = self
            .doc
            .get("tool")
            .and_then(|t| t.get("hatch"))
            .and_then(|h| h.get("envs"))
            .and_then(Item::as_table_like)
        {
            for (env, table) in envs.iter() {
                if let Some(item) = table.get("dependencies") {
                    sections.push(read_section(SectionKey::HatchEnv(env.to_string()), item)?);
                }
            }
        }

        Ok(sections)
    }

    /// Entries of one section, `None` when the section does not exist
    pub fn section(&self, key: &SectionKey) -> Result<Option<Vec<RequirementEntry>>> {
        match self.section_item(key) {
            Some(item) => Ok(Some(read_section(key.clone(), item)?.entries)),
            None => Ok(None),
        }
    }

    /// Check that `key` can be written to without touching the document
    pub fn ensure_available(&self, key: &SectionKey) -> Result<()> {
        match key {
            SectionKey::HatchEnv(env) if !self.has_hatch() => {
                Err(Error::HatchEnvUnavailable(env.clone()))
            }
            _ => Ok(()),
        }
    }

    fn section_item(&self, key: &SectionKey) -> Option<&Item> {
        let project = self.doc.get("project");
        match key {
            SectionKey::Dependencies => project?.get("dependencies"),
            SectionKey::Optional(group) => project?.get("optional-dependencies")?.get(group.as_str()),
            SectionKey::HatchEnv(env) => self
                .doc
                .get("tool")?
                .get("hatch")?
                .get("envs")?
                .get(env.as_str())?
                .get("dependencies"),
        }
    }

    pub(crate) fn array(&self, key: &SectionKey) -> Option<&Array> {
        self.section_item(key).and_then(Item::as_array)
    }

    /// Mutable access to a dependency array, creating missing tables and the array
    pub(crate) fn array_mut(&mut self, key: &SectionKey) -> Result<&mut Array> {
        self.ensure_available(key)?;

        let parent = match key {
            SectionKey::Dependencies => self.doc.get_mut("project"),
            SectionKey::Optional(_) => self
                .doc
                .get_mut("project")
                .and_then(|p| ensure_child_table(p, "optional-dependencies", false)),
            SectionKey::HatchEnv(env) => self
                .doc
                .get_mut("tool")
                .and_then(|t| t.get_mut("hatch"))
                .and_then(|h| ensure_child_table(h, "envs", true))
                .and_then(|envs| ensure_child_table(envs, env, false)),
        };
        let parent = parent.ok_or_else(|| Error::malformed(format!("cannot create {}", key)))?;

        let array_key = match key {
            SectionKey::Optional(group) => group.as_str(),
            _ => "dependencies",
        };
        ensure_array(parent, array_key)
            .ok_or_else(|| Error::malformed(format!("{} must be an array of strings", key)))
    }
}

impl fmt::Display for ManifestDocument {
    /// Serialize back to TOML text
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.doc)
    }
}

fn read_section(key: SectionKey, item: &Item) -> Result<ManifestSection> {
    let array = item
        .as_array()
        .ok_or_else(|| Error::malformed(format!("{} must be an array of strings", key)))?;

    let entries = array
        .iter()
        .map(|value| {
            let raw = value
                .as_str()
                .ok_or_else(|| Error::malformed(format!("{} must only contain strings", key)))?;
            RequirementEntry::parse(raw).map_err(|e| {
                Error::malformed(format!("invalid entry '{}' in {}: {}", raw, key, e))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ManifestSection { key, entries })
}

fn ensure_child_table<'a>(parent: &'a mut Item, key: &str, implicit: bool) -> Option<&'a mut Item> {
    let inline = parent.is_inline_table();
    let table = parent.as_table_like_mut()?;
    if !table.contains_key(key) {
        let child = if inline {
            Item::Value(Value::InlineTable(InlineTable::new()))
        } else {
            let mut child = Table::new();
            child.set_implicit(implicit);
            Item::Table(child)
        };
        table.insert(key, child);
    }
    table.get_mut(key).filter(|item| item.is_table_like())
}

fn ensure_array<'a>(parent: &'a mut Item, key: &str) -> Option<&'a mut Array> {
    let table = parent.as_table_like_mut()?;
    if !table.contains_key(key) {
        table.insert(key, Item::Value(Value::Array(Array::new())));
    }
    table.get_mut(key)?.as_array_mut()
}

/// Append a string, reusing the indentation of the current last element
pub(crate) fn push_formatted(array: &mut Array, value: &str) {
    let prefix = array
        .iter()
        .last()
        .and_then(|last| last.decor().prefix())
        .and_then(RawString::as_str)
        .map(|prefix| match prefix.rfind('\n') {
            // Comments before the last element belong to it, not to us
            Some(newline) => prefix[newline..].to_string(),
            None => prefix.to_string(),
        });

    // An inline comment on the old last element's line must stay there, after
    // the comma that now separates it from the new element.
    let carried = if array.trailing_comma() {
        let comment = leading_comment(array.trailing());
        if let Some(comment) = &comment {
            let rest = array.trailing().as_str().unwrap_or_default()[comment.len()..].to_string();
            array.set_trailing(rest);
        }
        comment
    } else {
        split_last_suffix(array)
    };

    array.push(value);
    let prefix = match (carried, prefix) {
        (Some(comment), Some(prefix)) if prefix.contains('\n') => Some(comment + &prefix),
        (Some(comment), _) => Some(comment + "\n"),
        (None, prefix) => prefix,
    };
    if let Some(prefix) = prefix {
        let last = array.len() - 1;
        if let Some(pushed) = array.get_mut(last) {
            pushed.decor_mut().set_prefix(prefix);
        }
    }
}

// Without a trailing comma the last element's suffix holds the rest of its
// line. Move the line break into the array trailing and return the comment.
fn split_last_suffix(array: &mut Array) -> Option<String> {
    let last = array.len().checked_sub(1)?;
    let value = array.get_mut(last)?;
    let suffix = value.decor().suffix().and_then(RawString::as_str)?.to_string();
    let newline = suffix.find('\n')?;
    value.decor_mut().set_suffix("");

    let trailing = format!("{}{}", &suffix[newline..], array.trailing().as_str().unwrap_or_default());
    array.set_trailing(trailing);

    let head = &suffix[..newline];
    head.contains('#').then(|| head.to_string())
}

/// Text before the first newline of `raw`, when it holds a comment
fn leading_comment(raw: &RawString) -> Option<String> {
    let text = raw.as_str()?;
    let head = &text[..text.find('\n')?];
    head.contains('#').then(|| head.to_string())
}

/// Remove an element without leaving stray whitespace at the front
pub(crate) fn remove_formatted(array: &mut Array, index: usize) -> Value {
    let prefix = array
        .get(index)
        .and_then(|value| value.decor().prefix())
        .cloned()
        .unwrap_or_else(|| RawString::from(""));

    let removed = array.remove(index);
    if index == 0 {
        if let Some(first) = array.get_mut(0) {
            let own = first.decor().prefix().and_then(RawString::as_str).unwrap_or_default();
            let joined = first_prefix_after_removal(prefix.as_str().unwrap_or_default(), own);
            first.decor_mut().set_prefix(joined);
        }
    } else if let Some(comment) = leading_comment(&prefix) {
        // The inline comment belongs to the element before the removed one
        match array.get_mut(index) {
            Some(next) => {
                let next_prefix = next.decor().prefix().and_then(RawString::as_str).unwrap_or_default();
                let joined = format!("{}{}", comment, next_prefix);
                next.decor_mut().set_prefix(joined);
            }
            None => {
                let trailing = array.trailing().as_str().unwrap_or_default();
                let joined = format!("{}{}", comment, trailing);
                array.set_trailing(joined);
            }
        }
    }
    if array.is_empty() {
        array.set_trailing_comma(false);
    }
    removed
}

// The new first element keeps its own comment lines and drops the inline
// comment of the removed element. Text right after `[` stays in place.
fn first_prefix_after_removal(removed: &str, own: &str) -> String {
    let head = removed.find('\n').map_or(removed, |newline| &removed[..newline]);
    let body = match (own.find('\n'), removed.rfind('\n')) {
        (Some(newline), _) => &own[newline..],
        (None, Some(newline)) => &removed[newline..],
        (None, None) => "",
    };
    format!("{}{}", head, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"[build-system]
requires = ["hatchling"]
build-backend = "hatchling.build"

[project]
name = "demo"  # the project
dynamic = ["version"]
dependencies = [
    "requests>=2.0",  # http
    "click",
]

[project.optional-dependencies]
dev = ["pytest", "ruff"]

[tool.hatch.envs.default]
dependencies = ["coverage"]
"#;

    #[test]
    fn test_roundtrip_is_byte_identical() {
        let doc = ManifestDocument::parse(MANIFEST).unwrap();
        assert_eq!(doc.to_string(), MANIFEST);
    }

    #[test]
    fn test_sections_in_document_order() {
        let doc = ManifestDocument::parse(MANIFEST).unwrap();
        let sections = doc.sections().unwrap();
        let keys: Vec<String> = sections.iter().map(|s| s.key.to_string()).collect();
        assert_eq!(
            keys,
            vec!["dependencies", "optional-dependencies.dev", "hatch.default"]
        );
        let names: Vec<&str> = sections[0].entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["requests", "click"]);
        assert_eq!(doc.project_name(), Some("demo"));
        assert!(doc.has_hatch());
    }

    #[test]
    fn test_missing_project_table() {
        let err = ManifestDocument::parse("[tool.black]\nline-length = 88\n").unwrap_err();
        assert!(matches!(err, Error::MalformedConfig(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let err = ManifestDocument::parse("[project\nname = 1").unwrap_err();
        assert!(matches!(err, Error::MalformedConfig(_)));
    }

    #[test]
    fn test_dependencies_must_be_strings() {
        let err = ManifestDocument::parse("[project]\ndependencies = [1, 2]\n").unwrap_err();
        assert!(matches!(err, Error::MalformedConfig(_)));

        let err = ManifestDocument::parse("[project]\ndependencies = \"requests\"\n").unwrap_err();
        assert!(matches!(err, Error::MalformedConfig(_)));

        let err = ManifestDocument::parse("[project]\ndependencies = [\"requests>>2\"]\n").unwrap_err();
        assert!(matches!(err, Error::MalformedConfig(_)));
    }

    #[test]
    fn test_missing_section_is_none() {
        let doc = ManifestDocument::parse("[project]\nname = \"x\"\n").unwrap();
        assert_eq!(doc.section(&SectionKey::Dependencies).unwrap(), None);
        assert!(doc.sections().unwrap().is_empty());
    }

    #[test]
    fn test_hatch_env_requires_hatch_table() {
        let doc = ManifestDocument::parse("[project]\nname = \"x\"\n").unwrap();
        let err = doc
            .ensure_available(&SectionKey::HatchEnv("dev".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::HatchEnvUnavailable(env) if env == "dev"));
    }

    #[test]
    fn test_load_reports_path() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("pyproject.toml");
        std::fs::write(&path, "not toml at all [").unwrap();

        let err = ManifestDocument::load(&path).unwrap_err();
        match err {
            Error::MalformedConfig(msg) => assert!(msg.contains("pyproject.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_push_keeps_multiline_layout() {
        let mut doc = ManifestDocument::parse(MANIFEST).unwrap();
        let array = doc.array_mut(&SectionKey::Dependencies).unwrap();
        push_formatted(array, "rich");
        assert!(doc
            .to_string()
            .contains("    \"requests>=2.0\",  # http\n    \"click\",\n    \"rich\",\n]"));
    }

    #[test]
    fn test_push_keeps_comment_on_previous_line() {
        let mut doc = ManifestDocument::parse("[project]\ndependencies = [\n    \"click>=8\",  # cli\n]\n").unwrap();
        let array = doc.array_mut(&SectionKey::Dependencies).unwrap();
        push_formatted(array, "rich");
        assert_eq!(
            doc.to_string(),
            "[project]\ndependencies = [\n    \"click>=8\",  # cli\n    \"rich\",\n]\n"
        );
    }

    #[test]
    fn test_remove_last_element_keeps_previous_comment() {
        let raw = "[project]\ndependencies = [\n    \"click>=8\",  # cli\n    \"rich\",\n]\n";
        let mut doc = ManifestDocument::parse(raw).unwrap();
        let array = doc.array_mut(&SectionKey::Dependencies).unwrap();
        remove_formatted(array, 1);
        assert_eq!(
            doc.to_string(),
            "[project]\ndependencies = [\n    \"click>=8\",  # cli\n]\n"
        );
    }

    #[test]
    fn test_push_after_uncommaed_comment_line() {
        let mut doc = ManifestDocument::parse("[project]\ndependencies = [\n    \"a\"  # about a\n]\n").unwrap();
        let array = doc.array_mut(&SectionKey::Dependencies).unwrap();
        push_formatted(array, "b");
        assert_eq!(
            doc.to_string(),
            "[project]\ndependencies = [\n    \"a\",  # about a\n    \"b\"\n]\n"
        );

        let mut doc = ManifestDocument::parse("[project]\ndependencies = [\n    \"a\"\n]\n").unwrap();
        let array = doc.array_mut(&SectionKey::Dependencies).unwrap();
        push_formatted(array, "b");
        assert_eq!(doc.to_string(), "[project]\ndependencies = [\n    \"a\",\n    \"b\"\n]\n");
    }

    #[test]
    fn test_remove_first_element_keeps_neighbour_comments() {
        let raw = "[project]\ndependencies = [\n    # http client\n    \"requests\",  # pinned later\n    # cli\n    \"click\",\n]\n";
        let mut doc = ManifestDocument::parse(raw).unwrap();
        let array = doc.array_mut(&SectionKey::Dependencies).unwrap();
        remove_formatted(array, 0);
        assert_eq!(
            doc.to_string(),
            "[project]\ndependencies = [\n    # cli\n    \"click\",\n]\n"
        );
    }

    #[test]
    fn test_remove_first_element_single_line() {
        let mut doc = ManifestDocument::parse(MANIFEST).unwrap();
        let array = doc
            .array_mut(&SectionKey::Optional("dev".to_string()))
            .unwrap();
        remove_formatted(array, 0);
        assert!(doc.to_string().contains("dev = [\"ruff\"]"));
    }
}
