//! Change set and dependency list output

use colored::*;
use pypip_deps::{ChangeSet, ManifestSection, SectionKey, SyncReport};
use std::fmt::Write;
use std::path::Path;

/// Lines describing one change set, prefixed `+`/`-`
pub fn format_change_set(changes: &ChangeSet) -> String {
    let mut out = String::new();
    for removed in &changes.removed {
        let _ = writeln!(out, "  {} {}", "-".red(), removed.red());
    }
    for added in &changes.added {
        let _ = writeln!(out, "  {} {}", "+".green(), added.to_string().green());
    }
    out
}

/// Summary of a sync for the terminal
pub fn format_report(report: &SyncReport, section: &SectionKey, manifest: &Path, dry_run: bool) -> String {
    let mut out = String::new();

    if report.manifest.unchanged {
        let _ = writeln!(out, "{} {} already up to date", "✓".green(), section.to_string().cyan());
    } else {
        let verb = if dry_run { "Would update" } else { "Updated" };
        let _ = writeln!(
            out,
            "{} {} [{}]",
            verb.bold(),
            manifest.display(),
            section.to_string().cyan()
        );
        out.push_str(&format_change_set(&report.manifest));
    }

    if let Some(requirements) = report.requirements.as_ref().filter(|c| !c.unchanged) {
        let _ = writeln!(out, "{} requirements file", "Updated".bold());
        out.push_str(&format_change_set(requirements));
    }

    if dry_run {
        let _ = writeln!(out, "{}", "Dry run: pip was not run and no files were written".yellow());
    }

    out
}

/// One dependency list
pub fn format_section(section: &ManifestSection) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format!("{}:", section.key).bold());
    if section.entries.is_empty() {
        let _ = writeln!(out, "  {}", "(none)".bright_black());
    }
    for entry in &section.entries {
        let _ = writeln!(out, "  {}", entry);
    }
    out
}
