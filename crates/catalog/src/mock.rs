//! In-memory fetcher for testing.

use crate::error::{ErrorKind, Result};
use crate::fetch::Fetch;
use async_trait::async_trait;
use futures::lock::Mutex;
use std::collections::HashMap;
use url::Url;

/// A [`Fetch`] that serves canned bodies by exact URL and answers everything
/// else with a 404.
///
/// # Examples
///
/// ```
/// use shelf_catalog::{Fetch, MockFetcher};
/// use url::Url;
///
/// # futures::executor::block_on(async {
/// let fetcher = MockFetcher::with_responses([("https://example.com/index.json", "[]")]);
/// let url = Url::parse("https://example.com/index.json").unwrap();
/// assert_eq!(fetcher.text(&url).await.unwrap(), "[]");
/// assert_eq!(fetcher.requests().await, vec![url.to_string()]);
/// # });
/// ```
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    /// Create a fetcher pre-populated with `(url, body)` pairs.
    ///
    /// Panics if a URL doesn't parse; if test setup is wrong, then the test
    /// should not pass.
    pub fn with_responses(responses: impl IntoIterator<Item = (impl AsRef<str>, impl Into<String>)>) -> Self {
        let responses = responses
            .into_iter()
            .map(|(url, body)| match Url::parse(url.as_ref()) {
                Ok(url) => (url.to_string(), body.into()),
                Err(e) => panic!("MockFetcher::with_responses: invalid URL {}: {e}", url.as_ref()),
            })
            .collect();
        Self {
            responses,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every URL requested so far, in request order.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn text(&self, url: &Url) -> Result<String> {
        self.requests.lock().await.push(url.to_string());
        match self.responses.get(url.as_str()) {
            Some(body) => Ok(body.clone()),
            None => exn::bail!(ErrorKind::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}
