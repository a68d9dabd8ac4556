//! Keiyoushi extension index (Tachiyomi sources).
//!
//! The index is a JSON array of extensions, each bundling one or more sources:
//!
//! ```json
//! [{"name": "Tachiyomi: MangaDex", "lang": "all", "sources": [
//!     {"id": "2499283573021220255", "name": "MangaDex", "lang": "en", "baseUrl": "https://mangadex.org"}
//! ]}]
//! ```
//!
//! Source ids are signed 64-bit numbers, but may be published as strings or as
//! (possibly unsigned) JSON numbers.

use crate::error::Result;
use crate::fetch::{Fetch, json};
use serde::Deserialize;
use shelf_identity::{CatalogEntry, parse_source_id};
use tracing::instrument;
use url::Url;

#[derive(Debug, Deserialize)]
pub struct Extension {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub sources: Vec<ExtensionSource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionSource {
    pub id: SourceId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SourceId {
    Number(serde_json::Number),
    Text(String),
}
impl SourceId {
    /// The id as a signed 64-bit integer, if it is one.
    pub fn parse(&self) -> Option<i64> {
        let parsed = match self {
            SourceId::Number(number) => parse_source_id(&number.to_string()),
            SourceId::Text(text) => parse_source_id(text),
        };
        parsed.ok()
    }
}

/// Try each index URL in order; the first one that downloads and parses wins.
#[instrument(level = "debug", skip(fetcher, urls), fields(candidates = urls.len()))]
pub async fn fetch(fetcher: &dyn Fetch, urls: &[Url], languages: &[String]) -> Result<Vec<CatalogEntry>> {
    let mut last_error = None;
    for url in urls {
        match json::<Vec<Extension>>(fetcher, url).await {
            Ok(extensions) => {
                tracing::debug!(%url, extensions = extensions.len(), "Parsed Keiyoushi index");
                return Ok(entries(&extensions, languages));
            },
            Err(e) => {
                tracing::debug!(%url, error = ?e, "Keiyoushi index unavailable, trying next");
                last_error = Some(e);
            },
        }
    }
    match last_error {
        Some(e) => Err(e),
        None => Ok(Vec::new()),
    }
}

/// Flatten extensions into catalog entries, keeping only the requested
/// languages (all of them when `languages` is empty).
pub fn entries(extensions: &[Extension], languages: &[String]) -> Vec<CatalogEntry> {
    let wanted = |lang: &str| languages.is_empty() || languages.iter().any(|l| l.eq_ignore_ascii_case(lang));
    extensions
        .iter()
        .flat_map(|extension| extension.sources.iter().map(move |source| (extension, source)))
        .filter(|(extension, source)| wanted(&extension.lang) || source.lang.as_deref().is_some_and(wanted))
        .filter_map(|(_, source)| {
            let Some(id) = source.id.parse() else {
                tracing::debug!(id = ?source.id, name = %source.name, "Skipping source with unusable id");
                return None;
            };
            Some(CatalogEntry::new(id.to_string(), source.name.trim(), source.base_url.as_deref()))
        })
        .collect()
}
