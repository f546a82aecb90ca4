//! PyPI JSON API client

use crate::client::HttpClient;
use crate::error::{Error, Result};
use crate::repository::find_repository;
use crate::types::{PackageInfo, PackageVersions};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use url::Url;

/// Registry label used in errors
pub(crate) const REGISTRY: &str = "PyPI";

/// PyPI `/pypi/<name>/json` response
#[derive(Debug, Deserialize)]
pub(crate) struct PyPiResponse {
    info: PyPiInfo,
    #[serde(default)]
    releases: HashMap<String, Vec<ReleaseFile>>,
    #[serde(default)]
    urls: Vec<ReleaseFile>,
}

#[derive(Debug, Deserialize)]
struct PyPiInfo {
    name: String,
    version: String,
    summary: Option<String>,
    description: Option<String>,
    description_content_type: Option<String>,
    license: Option<String>,
    requires_python: Option<String>,
    author: Option<String>,
    author_email: Option<String>,
    home_page: Option<String>,
    #[serde(default)]
    project_urls: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFile {
    upload_time_iso_8601: Option<DateTime<Utc>>,
    #[serde(default)]
    yanked: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty() && s.trim() != "UNKNOWN")
}

impl PyPiResponse {
    /// Non-yanked versions in ascending order
    pub(crate) fn versions(&self) -> Vec<String> {
        let published = self
            .releases
            .iter()
            .filter(|(_, files)| files.is_empty() || files.iter().any(|f| !f.yanked))
            .map(|(version, _)| version.clone());
        pypip_deps::sort_versions(published)
    }

    pub(crate) fn into_versions(self) -> PackageVersions {
        PackageVersions {
            versions: self.versions(),
            name: self.info.name,
            summary: non_empty(self.info.summary),
        }
    }

    pub(crate) fn into_package_info(self) -> PackageInfo {
        let versions = self.versions();
        let version = pypip_deps::latest_final(versions.iter().map(String::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| self.info.version.clone());
        let released_at = self
            .releases
            .get(&version)
            .unwrap_or(&self.urls)
            .iter()
            .filter_map(|file| file.upload_time_iso_8601)
            .min();

        let info = self.info;
        let project_urls = info.project_urls.unwrap_or_default();
        let home_page = non_empty(info.home_page).or_else(|| {
            project_urls
                .iter()
                .find(|(label, _)| label.eq_ignore_ascii_case("homepage"))
                .map(|(_, url)| url.clone())
        });

        PackageInfo {
            repository: find_repository(&project_urls, home_page.as_deref()),
            name: info.name,
            version,
            summary: non_empty(info.summary),
            description: non_empty(info.description),
            description_content_type: non_empty(info.description_content_type),
            license: non_empty(info.license),
            requires_python: non_empty(info.requires_python),
            author: non_empty(info.author).or_else(|| non_empty(info.author_email)),
            homepage: home_page,
            project_urls,
            released_at,
            release_count: versions.len(),
        }
    }
}

/// Fetch the raw JSON document for a package
pub(crate) async fn fetch_pypi_json(client: &HttpClient, base: &Url, name: &str) -> Result<PyPiResponse> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidPackageName("Package name cannot be empty".to_string()));
    }
    if name.contains(['/', '?', '#']) || name.chars().any(char::is_whitespace) {
        return Err(Error::InvalidPackageName(name.to_string()));
    }

    let url = base.join(&format!("pypi/{}/json", name))?;
    client.get_json(url.as_str()).await.map_err(|e| {
        if e.is_not_found() {
            Error::PackageNotFound(name.to_string(), REGISTRY.to_string())
        } else {
            e
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r##"{
        "info": {
            "name": "requests",
            "version": "2.32.0rc1",
            "summary": "Python HTTP for Humans.",
            "description": "# Requests\n\n**Requests** is a simple HTTP library.",
            "description_content_type": "text/markdown",
            "license": "Apache-2.0",
            "requires_python": ">=3.8",
            "author": "",
            "author_email": "me@kennethreitz.org",
            "home_page": "https://requests.readthedocs.io",
            "project_urls": {
                "Documentation": "https://requests.readthedocs.io",
                "Source": "https://github.com/psf/requests"
            }
        },
        "releases": {
            "2.9.0": [{"upload_time_iso_8601": "2015-12-15T14:00:00.000000Z", "yanked": false}],
            "2.31.0": [{"upload_time_iso_8601": "2023-05-22T15:12:44.175097Z", "yanked": false}],
            "2.32.0rc1": [{"upload_time_iso_8601": "2024-05-01T10:00:00.000000Z", "yanked": false}],
            "2.30.1": [{"upload_time_iso_8601": "2023-05-01T10:00:00.000000Z", "yanked": true}],
            "0.2.0": []
        },
        "urls": []
    }"##;

    fn response() -> PyPiResponse {
        serde_json::from_str(FIXTURE).unwrap()
    }

    #[test]
    fn test_versions_are_sorted_and_skip_yanked() {
        assert_eq!(response().versions(), vec!["0.2.0", "2.9.0", "2.31.0", "2.32.0rc1"]);
    }

    #[test]
    fn test_package_info_uses_latest_final() {
        let info = response().into_package_info();
        assert_eq!(info.name, "requests");
        assert_eq!(info.version, "2.31.0");
        assert_eq!(info.author.as_deref(), Some("me@kennethreitz.org"));
        assert_eq!(info.requires_python.as_deref(), Some(">=3.8"));
        assert_eq!(info.release_count, 4);
        assert!(info.has_markdown_description());
        assert_eq!(info.repository.unwrap().url, "https://github.com/psf/requests");
        assert_eq!(
            info.released_at.unwrap().to_rfc3339(),
            "2023-05-22T15:12:44.175097+00:00"
        );
    }

    #[test]
    fn test_into_versions() {
        let versions = response().into_versions();
        assert_eq!(versions.summary.as_deref(), Some("Python HTTP for Humans."));
        assert_eq!(versions.latest(), Some("2.31.0"));
    }

    #[test]
    fn test_missing_optional_fields() {
        let minimal = r#"{"info": {"name": "x", "version": "1.0", "summary": null, "description": "",
            "description_content_type": null, "license": "UNKNOWN", "requires_python": null,
            "author": null, "author_email": null, "home_page": null, "project_urls": null}}"#;
        let info = serde_json::from_str::<PyPiResponse>(minimal).unwrap().into_package_info();
        assert_eq!(info.version, "1.0");
        assert!(info.description.is_none());
        assert!(info.license.is_none());
        assert!(info.repository.is_none());
        assert!(info.released_at.is_none());
    }

    #[tokio::test]
    async fn test_invalid_package_name() {
        let client = HttpClient::new().unwrap();
        let base = Url::parse("https://pypi.org/").unwrap();
        assert!(matches!(
            fetch_pypi_json(&client, &base, "  ").await,
            Err(Error::InvalidPackageName(_))
        ));
        assert!(matches!(
            fetch_pypi_json(&client, &base, "../admin").await,
            Err(Error::InvalidPackageName(_))
        ));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_nonexistent_package() {
        let client = HttpClient::new().unwrap();
        let base = Url::parse("https://pypi.org/").unwrap();
        let result = fetch_pypi_json(&client, &base, "this-package-definitely-does-not-exist-12345").await;
        assert!(matches!(result, Err(Error::PackageNotFound(_, _))));
    }
}
