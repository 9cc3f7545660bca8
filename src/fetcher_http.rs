//! HTTP-based page fetcher using reqwest.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::fetcher::PageFetcher;
use crate::{Result, SearchError};

pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (compatible; a3s-metasearch/0.1)";

/// Builds the reqwest client shared by HTTP-backed adapters.
pub(crate) fn build_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Maps a non-success HTTP status into a typed adapter error.
pub(crate) fn check_status(url: &str, status: StatusCode) -> Result<()> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(SearchError::AdapterRateLimited(format!("HTTP 429 from {}", url)));
    }
    if !status.is_success() {
        return Err(SearchError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(())
}

/// A page fetcher that uses plain HTTP requests via reqwest.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a new `HttpFetcher` with default settings.
    pub fn new() -> Self {
        Self {
            client: build_client(),
        }
    }

    /// Creates an `HttpFetcher` with a custom reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        check_status(url, response.status())?;
        let body = response.text().await?;
        Ok(body)
    }
}
