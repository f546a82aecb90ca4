//! PyPI metadata fetcher for pypip
//!
//! Looks up package metadata, published versions and search results on PyPI
//! (or any index that serves the same JSON API and search page).
//!
//! # Example
//!
//! ```no_run
//! use pypip_info::{InfoClient, PackageRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = InfoClient::new()?;
//!
//!     let requests = client.fetch_pypi("requests").await?;
//!     println!("requests v{}", requests.version);
//!
//!     let versions = client.query("click").await?;
//!     println!("click has {} releases", versions.versions.len());
//!
//!     for hit in client.search("pytest", 5).await? {
//!         println!("{} {}", hit.name, hit.version);
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod pypi;
mod repository;
mod search;
mod types;

pub use error::{Error, Result};
pub use repository::{find_repository, parse_repository_url};
pub use search::parse_search_results;
pub use types::{PackageInfo, PackageVersions, RepositoryUrl, SearchHit};

use async_trait::async_trait;
use client::HttpClient;
use url::Url;

/// Default package index
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/";

/// Read-only view of a package registry
#[async_trait]
pub trait PackageRegistry: Send + Sync {
    /// Published versions (ascending) and summary
    async fn query(&self, name: &str) -> Result<PackageVersions>;

    /// Full package metadata
    async fn fetch_pypi(&self, name: &str) -> Result<PackageInfo>;

    /// Search results in registry order
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;

    /// Highest final release, or `None` when the package has none
    async fn latest_version(&self, name: &str) -> Result<Option<String>> {
        Ok(self.query(name).await?.latest().map(str::to_string))
    }
}

/// Main client for fetching package information
///
/// By default requests are limited to 1 per second.
pub struct InfoClient {
    client: HttpClient,
    base_url: Url,
}

impl InfoClient {
    /// Create a client for pypi.org with rate limiting enabled (recommended)
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self> {
        Self::with_index_url(DEFAULT_INDEX_URL, 1)
    }

    /// Create a client for a custom index
    ///
    /// # Arguments
    ///
    /// * `index_url` - Base URL serving `/pypi/<name>/json` and `/search/`
    /// * `requests_per_second` - Client-side rate limit
    pub fn with_index_url(index_url: &str, requests_per_second: u32) -> Result<Self> {
        let mut base_url = Url::parse(index_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: HttpClient::with_rate_limit(requests_per_second)?,
            base_url,
        })
    }

    /// Index this client talks to
    pub fn index_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl PackageRegistry for InfoClient {
    async fn query(&self, name: &str) -> Result<PackageVersions> {
        let response = pypi::fetch_pypi_json(&self.client, &self.base_url, name).await?;
        Ok(response.into_versions())
    }

    async fn fetch_pypi(&self, name: &str) -> Result<PackageInfo> {
        let response = pypi::fetch_pypi_json(&self.client, &self.base_url, name).await?;
        Ok(response.into_package_info())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        search::search_packages(&self.client, &self.base_url, query, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_url_gets_trailing_slash() {
        let client = InfoClient::with_index_url("https://mirror.example.com/pypi-proxy", 1).unwrap();
        assert_eq!(client.index_url().as_str(), "https://mirror.example.com/pypi-proxy/");
        assert_eq!(
            client.index_url().join("pypi/click/json").unwrap().as_str(),
            "https://mirror.example.com/pypi-proxy/pypi/click/json"
        );
    }

    #[test]
    fn test_invalid_index_url() {
        assert!(matches!(
            InfoClient::with_index_url("not a url", 1),
            Err(Error::InvalidUrl(_))
        ));
    }
}
