//! Definition retrieval.
//!
//! # Responsibilities
//! - Load the raw text behind a definition URI
//! - `http`/`https` through a shared HTTP client with a request timeout
//! - `file` from the local filesystem
//!
//! # Design Decisions
//! - The timeout is owned here; callers see a timeout as an ordinary error
//! - Non-2xx responses are errors, the body is not inspected

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::FetchError;

/// Loads the text of a resource identified by a URI.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, uri: &Url) -> Result<String, FetchError>;
}

/// Default [`ResourceFetcher`] for `http`, `https` and `file` URIs.
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    client: reqwest::Client,
}

impl ResourceLoader {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("openapi-route-locator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client })
    }

    /// Use a preconfigured client (proxy settings, TLS roots, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_http(&self, uri: &Url) -> Result<String, FetchError> {
        let response = self.client.get(uri.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    async fn fetch_file(&self, uri: &Url) -> Result<String, FetchError> {
        let path = uri
            .to_file_path()
            .map_err(|_| FetchError::InvalidFilePath(uri.to_string()))?;

        Ok(tokio::fs::read_to_string(path).await?)
    }
}

#[async_trait]
impl ResourceFetcher for ResourceLoader {
    async fn fetch(&self, uri: &Url) -> Result<String, FetchError> {
        match uri.scheme() {
            "http" | "https" => self.fetch_http(uri).await,
            "file" => self.fetch_file(uri).await,
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }
}
