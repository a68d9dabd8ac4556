//! The network boundary.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use serde::de::DeserializeOwned;
use shelf_config::CatalogConfig;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("shelf/", env!("CARGO_PKG_VERSION"));
/// Only requests to this host carry the bearer token.
const TOKEN_HOST: &str = "api.github.com";

/// Read-only retrieval of remote documents.
///
/// One attempt per call, no retries. Implementations must be safe to call
/// concurrently: batches of requests are issued in parallel.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch a document as text. Non-success statuses are errors.
    async fn text(&self, url: &Url) -> Result<String>;
}

/// Fetch and deserialize a JSON document.
pub async fn json<T: DeserializeOwned>(fetcher: &dyn Fetch, url: &Url) -> Result<T> {
    let body = fetcher.text(url).await?;
    serde_json::from_str(&body).or_raise(|| ErrorKind::InvalidResponse(url.to_string()))
}

/// [`Fetch`] over HTTPS with `reqwest`.
pub struct HttpFetcher {
    client: reqwest::Client,
    token: Option<String>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .or_raise(|| ErrorKind::Client)?;
        Ok(Self { client, token })
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Self::new(config.timeout(), config.token())
    }

    /// The token to attach to a request for `url`, if any.
    fn token_for(&self, url: &Url) -> Option<&str> {
        match url.host_str() {
            Some(TOKEN_HOST) => self.token.as_deref(),
            _ => None,
        }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn text(&self, url: &Url) -> Result<String> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = self.token_for(url) {
            request = request.bearer_auth(token);
        }
        tracing::trace!(%url, authorized = self.token_for(url).is_some(), "GET");
        let response = request.send().await.or_raise(|| ErrorKind::Network(url.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        response.text().await.or_raise(|| ErrorKind::Network(url.to_string()))
    }
}
