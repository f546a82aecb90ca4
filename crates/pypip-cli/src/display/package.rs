//! Registry results: package info and search hits

use super::markdown::render_markdown;
use chrono::{DateTime, Utc};
use colored::*;
use pypip_info::{PackageInfo, SearchHit};
use std::fmt::Write;

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// Package details, with the long description when `verbose`
pub fn format_package_info(info: &PackageInfo, verbose: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", info.name.bold(), info.version.green());
    if let Some(summary) = &info.summary {
        let _ = writeln!(out, "{}", summary);
    }
    out.push('\n');

    let mut field = |label: &str, value: Option<String>| {
        if let Some(value) = value {
            let _ = writeln!(out, "  {:<16} {}", format!("{}:", label).bright_black(), value);
        }
    };
    field("Released", info.released_at.map(|d| format_date(Some(d))));
    field("Releases", Some(info.release_count.to_string()));
    field("Requires-Python", info.requires_python.clone());
    field("License", info.license.as_ref().map(|l| first_line(l)));
    field("Author", info.author.clone());
    field("Homepage", info.homepage.clone());
    field("Repository", info.repository.as_ref().map(|r| r.url.clone()));

    let extra_urls: Vec<_> = info
        .project_urls
        .iter()
        .filter(|(_, url)| Some(url.as_str()) != info.homepage.as_deref())
        .collect();
    if !extra_urls.is_empty() {
        let _ = writeln!(out, "\n  {}", "Project URLs:".bright_black());
        for (label, url) in extra_urls {
            let _ = writeln!(out, "    {}: {}", label, url);
        }
    }

    if verbose {
        if let Some(description) = &info.description {
            let body = if info.has_markdown_description() {
                render_markdown(description)
            } else {
                description.trim().to_string()
            };
            let _ = writeln!(out, "\n{}", body);
        }
    }

    out
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().trim().to_string()
}

/// Search hits, one per line, in registry order
pub fn format_search_hits(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No packages found for '{}'\n", query);
    }

    let width = hits.iter().map(|h| h.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for hit in hits {
        let _ = write!(out, "{:<width$}  {:<10}", hit.name.bold(), hit.version.green(), width = width);
        let date = format_date(hit.released_at);
        if !date.is_empty() {
            let _ = write!(out, "  {}", date.bright_black());
        }
        if !hit.description.is_empty() {
            let _ = write!(out, "  {}", hit.description);
        }
        out.push('\n');
    }
    out
}
