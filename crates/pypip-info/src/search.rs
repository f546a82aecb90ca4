//! PyPI search page scraping
//!
//! PyPI has no JSON search API, so results are read from the HTML search page.
//! Hits keep the registry's own order.

use crate::client::HttpClient;
use crate::error::{Error, Result};
use crate::types::SearchHit;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

struct SnippetPatterns {
    block: Regex,
    name: Regex,
    version: Regex,
    created: Regex,
    description: Regex,
}

fn patterns() -> &'static SnippetPatterns {
    static PATTERNS: OnceLock<SnippetPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let span = |class: &str| {
            Regex::new(&format!(r#"(?s)class="package-snippet__{}"[^>]*>(.*?)</"#, class))
                .expect("snippet pattern is valid")
        };
        SnippetPatterns {
            block: Regex::new(r#"(?s)<a[^>]*class="package-snippet"[^>]*>(.*?)</a>"#)
                .expect("snippet block pattern is valid"),
            name: span("name"),
            version: span("version"),
            created: Regex::new(r#"<time[^>]*datetime="([^"]+)""#).expect("time pattern is valid"),
            description: span("description"),
        }
    })
}

fn unescape_html(text: &str) -> String {
    text.trim()
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

fn parse_created(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Extract search hits from a PyPI search results page
pub fn parse_search_results(html: &str, limit: usize) -> Vec<SearchHit> {
    let patterns = patterns();
    let capture = |re: &Regex, block: &str| {
        re.captures(block)
            .and_then(|c| c.get(1))
            .map(|m| unescape_html(m.as_str()))
    };

    patterns
        .block
        .captures_iter(html)
        .filter_map(|block| {
            let block = block.get(1)?.as_str();
            let name = capture(&patterns.name, block)?;
            Some(SearchHit {
                name,
                version: capture(&patterns.version, block).unwrap_or_default(),
                description: capture(&patterns.description, block).unwrap_or_default(),
                released_at: patterns
                    .created
                    .captures(block)
                    .and_then(|c| c.get(1))
                    .and_then(|m| parse_created(m.as_str())),
            })
        })
        .take(limit)
        .collect()
}

/// Run a search against the registry's HTML search page
pub(crate) async fn search_packages(
    client: &HttpClient,
    base: &Url,
    query: &str,
    limit: usize,
) -> Result<Vec<SearchHit>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::other("search query cannot be empty"));
    }

    let mut url = base.join("search/")?;
    url.query_pairs_mut().append_pair("q", query);

    let html = client.get_text(url.as_str()).await?;
    let hits = parse_search_results(&html, limit);
    tracing::debug!(query, hits = hits.len(), "search finished");
    Ok(hits)
}
