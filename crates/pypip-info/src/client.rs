//! HTTP client wrapper with rate limiting

use crate::error::{Error, Result};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Rate limiter shared by every request to one registry
pub type RegistryRateLimiter = Arc<
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>,
>;

/// HTTP client wrapper for registry requests with optional rate limiting
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    rate_limiter: Option<RegistryRateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client without rate limiting
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            rate_limiter: None,
        })
    }

    /// Create a new HTTP client with rate limiting
    ///
    /// # Arguments
    ///
    /// * `requests_per_second` - Maximum requests per second (PyPI asks for restraint; 1 is the default)
    pub fn with_rate_limit(requests_per_second: u32) -> Result<Self> {
        let per_second = NonZeroU32::new(requests_per_second)
            .ok_or_else(|| Error::other("requests_per_second must be at least 1"))?;
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self {
            client: build_client()?,
            rate_limiter: Some(rate_limiter),
        })
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        self.wait_for_rate_limit().await;
        tracing::debug!(url, "GET");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimitExceeded(url.to_string()));
        }
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// Make a GET request and deserialize the JSON response
    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let json = self.get(url).await?.json().await?;
        Ok(json)
    }

    /// Make a GET request and return the response text
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let text = self.get(url).await?.text().await?;
        Ok(text)
    }
}

fn build_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(format!("pypip/{}", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()?;
    Ok(client)
}
