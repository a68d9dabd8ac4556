//! Live source catalogs.
//!
//! Fetches the Keiyoushi extension index (Tachiyomi sources) and scrapes the
//! Doki parser repository (Kotatsu sources), producing [`CatalogEntry`] lists
//! to merge over the built-in knowledge base. Everything here is best effort:
//! [`sync`] never fails, it just returns less.

pub mod doki;
pub mod error;
mod fetch;
pub mod keiyoushi;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use crate::fetch::{Fetch, HttpFetcher, json};
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::MockFetcher;
use crate::error::Result;
use shelf_config::CatalogConfig;
use shelf_identity::{CatalogEntry, RegistryBuilder};
use tracing::instrument;

/// Entries fetched from both live catalogs.
#[derive(Debug, Default)]
pub struct LiveCatalogs {
    pub tachiyomi: Vec<CatalogEntry>,
    pub kotatsu: Vec<CatalogEntry>,
}

impl LiveCatalogs {
    pub fn is_empty(&self) -> bool {
        self.tachiyomi.is_empty() && self.kotatsu.is_empty()
    }

    /// Merge into a registry under construction. Keys owned by the built-in
    /// knowledge base are left alone.
    pub fn merge_into(self, builder: &mut RegistryBuilder) {
        let fetched = (self.tachiyomi.len(), self.kotatsu.len());
        let tachiyomi = builder.merge_tachiyomi(self.tachiyomi);
        let kotatsu = builder.merge_kotatsu(self.kotatsu);
        tracing::info!(
            tachiyomi.fetched = fetched.0,
            tachiyomi.merged = tachiyomi,
            kotatsu.fetched = fetched.1,
            kotatsu.merged = kotatsu,
            "Merged live catalogs"
        );
    }
}

/// Fetch both live catalogs concurrently.
///
/// A catalog that can't be fetched or parsed is logged and comes back empty;
/// results are only returned once every request has finished, so callers see
/// either nothing or everything that could be fetched.
#[instrument(skip_all, fields(enabled = config.enabled))]
pub async fn sync(fetcher: &dyn Fetch, config: &CatalogConfig) -> LiveCatalogs {
    if !config.enabled {
        tracing::info!("Live catalog sync disabled; using built-in knowledge only");
        return LiveCatalogs::default();
    }
    tracing::info!("Synchronizing live catalogs");
    let (tachiyomi, kotatsu) = futures::join!(
        keiyoushi::fetch(fetcher, &config.keiyoushi_urls, &config.languages),
        doki::fetch(fetcher, &config.doki_tree_url, &config.doki_raw_base, config.batch_size),
    );
    LiveCatalogs {
        tachiyomi: degrade("keiyoushi", tachiyomi),
        kotatsu: degrade("doki", kotatsu),
    }
}

fn degrade(catalog: &'static str, result: Result<Vec<CatalogEntry>>) -> Vec<CatalogEntry> {
    match result {
        Ok(entries) => {
            tracing::info!(catalog, entries = entries.len(), "Fetched live catalog");
            entries
        },
        Err(e) => {
            tracing::warn!(
                catalog,
                retryable = e.is_retryable(),
                error = ?e,
                "Live catalog unavailable; using built-in knowledge only"
            );
            Vec::new()
        },
    }
}
