use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::OtoResult;

use super::traits::{FetchResponse, Fetcher};

/// Fetches fragments over HTTP relative to a base URL.
pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute paths pass through untouched.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches("./").trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn get(&self, path: &str) -> OtoResult<FetchResponse> {
        let url = self.resolve(path);
        debug!(url = %url, "Fetching fragment");

        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(url = %url, status = status, bytes = body.len(), "Fragment response");
        Ok(FetchResponse::new(status, body))
    }
}
