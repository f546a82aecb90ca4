//! Repository URL parsing and validation

use crate::error::{Error, Result};
use crate::types::RepositoryUrl;
use std::collections::BTreeMap;
use url::Url;

/// Project URL labels checked first when looking for the source repository
const SOURCE_LABELS: &[&str] = &["source", "source code", "repository", "code", "github", "homepage"];

/// Parse a repository URL string into a RepositoryUrl
///
/// Supports:
/// - https://github.com/owner/repo
/// - https://github.com/owner/repo.git
/// - https://github.com/owner/repo/tree/main/subdir
/// - git+https://github.com/owner/repo.git
/// - git@github.com:owner/repo.git
pub fn parse_repository_url(url_str: &str) -> Result<RepositoryUrl> {
    let trimmed = url_str.trim();
    let trimmed = trimmed.strip_prefix("git+").unwrap_or(trimmed);

    if let Some(ssh_part) = trimmed.strip_prefix("git@") {
        let (host, path) = ssh_part
            .split_once(':')
            .ok_or_else(|| Error::InvalidRepositoryUrl(format!("Invalid SSH URL format: {}", url_str)))?;
        if !host.ends_with("github.com") {
            return Err(Error::UnsupportedRepositoryHost(host.to_string()));
        }
        return owner_and_repo(path, url_str);
    }

    let url = Url::parse(trimmed)
        .map_err(|_| Error::InvalidRepositoryUrl(format!("Could not parse URL: {}", url_str)))?;
    let host = url
        .host_str()
        .ok_or_else(|| Error::InvalidRepositoryUrl(format!("No host found in URL: {}", url_str)))?;
    if host != "github.com" && host != "www.github.com" {
        return Err(Error::UnsupportedRepositoryHost(host.to_string()));
    }

    owner_and_repo(url.path(), url_str)
}

fn owner_and_repo(path: &str, original: &str) -> Result<RepositoryUrl> {
    let mut parts = path.trim_matches('/').split('/');
    let (Some(owner), Some(repo)) = (parts.next(), parts.next()) else {
        return Err(Error::InvalidRepositoryUrl(format!(
            "Could not extract owner/repo from: {}",
            original
        )));
    };
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if owner.is_empty() || repo.is_empty() {
        return Err(Error::InvalidRepositoryUrl(format!(
            "Could not extract owner/repo from: {}",
            original
        )));
    }

    Ok(RepositoryUrl::new(
        owner,
        repo,
        format!("https://github.com/{}/{}", owner, repo),
    ))
}

/// Pick the GitHub repository out of a package's project URLs
///
/// Well-known labels win; otherwise the first URL that parses as GitHub.
pub fn find_repository(
    project_urls: &BTreeMap<String, String>,
    home_page: Option<&str>,
) -> Option<RepositoryUrl> {
    let labelled = project_urls
        .iter()
        .filter(|(label, _)| SOURCE_LABELS.contains(&label.to_ascii_lowercase().as_str()))
        .map(|(_, url)| url.as_str());

    labelled
        .chain(home_page)
        .chain(project_urls.values().map(String::as_str))
        .find_map(|url| parse_repository_url(url).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https_url() {
        let result = parse_repository_url("https://github.com/pytest-dev/pytest").unwrap();
        assert_eq!(result.owner, "pytest-dev");
        assert_eq!(result.repo, "pytest");
        assert_eq!(result.url, "https://github.com/pytest-dev/pytest");
    }

    #[test]
    fn test_parse_variants() {
        for url in [
            "https://github.com/psf/requests.git",
            "git+https://github.com/psf/requests.git",
            "git@github.com:psf/requests.git",
            "https://github.com/psf/requests/tree/main/src",
        ] {
            let parsed = parse_repository_url(url).unwrap();
            assert_eq!((parsed.owner.as_str(), parsed.repo.as_str()), ("psf", "requests"), "{}", url);
        }
    }

    #[test]
    fn test_parse_unsupported_host() {
        let result = parse_repository_url("https://gitlab.com/owner/repo");
        assert!(matches!(result, Err(Error::UnsupportedRepositoryHost(_))));
        assert!(matches!(
            parse_repository_url("https://github.com/only-owner"),
            Err(Error::InvalidRepositoryUrl(_))
        ));
    }

    #[test]
    fn test_find_repository_prefers_source_label() {
        let urls = BTreeMap::from([
            ("Changelog".to_string(), "https://github.com/other/changes".to_string()),
            ("Source".to_string(), "https://github.com/pallets/click/".to_string()),
            ("Documentation".to_string(), "https://click.palletsprojects.com/".to_string()),
        ]);
        let repo = find_repository(&urls, None).unwrap();
        assert_eq!(repo.url, "https://github.com/pallets/click");
    }

    #[test]
    fn test_find_repository_falls_back() {
        let urls = BTreeMap::from([("Docs".to_string(), "https://docs.example.org".to_string())]);
        assert!(find_repository(&urls, None).is_none());
        let repo = find_repository(&urls, Some("https://github.com/a/b")).unwrap();
        assert_eq!(repo.repo, "b");
    }
}
