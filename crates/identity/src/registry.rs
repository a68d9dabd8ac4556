use crate::catalog::{Catalog, CatalogBuilder};
use crate::models::CatalogEntry;
use crate::rewrite::{UrlRewrite, rewrite_for};
use crate::seed;

/// Both applications' catalogs, frozen for the duration of a run.
///
/// Built once (seed, then any live data) through a [`RegistryBuilder`] and
/// only ever shared by reference afterwards; there is no way to mutate a
/// `Registry` once it exists.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    tachiyomi: Catalog,
    kotatsu: Catalog,
}
impl Registry {
    /// A registry made only from the built-in knowledge base.
    pub fn seeded() -> Self {
        RegistryBuilder::seeded().build()
    }

    /// Sources keyed by numeric Tachiyomi source id.
    pub fn tachiyomi(&self) -> &Catalog {
        &self.tachiyomi
    }

    /// Sources keyed by constant-style Kotatsu source key.
    pub fn kotatsu(&self) -> &Catalog {
        &self.kotatsu
    }

    /// URL rewrites for a Tachiyomi source id.
    pub fn url_rewrite(&self, tachiyomi_id: &str) -> &'static UrlRewrite {
        rewrite_for(tachiyomi_id)
    }
}

/// Assembles a [`Registry`]: seed first, then live merges, then [`build`](Self::build).
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    tachiyomi: CatalogBuilder,
    kotatsu: CatalogBuilder,
}
impl RegistryBuilder {
    /// Start from the built-in knowledge base.
    pub fn seeded() -> Self {
        Self {
            tachiyomi: CatalogBuilder::seeded(seed::tachiyomi()),
            kotatsu: CatalogBuilder::seeded(seed::kotatsu()),
        }
    }

    /// Start from caller-provided seeds.
    pub fn with_seeds(
        tachiyomi: impl IntoIterator<Item = CatalogEntry>,
        kotatsu: impl IntoIterator<Item = CatalogEntry>,
    ) -> Self {
        Self {
            tachiyomi: CatalogBuilder::seeded(tachiyomi),
            kotatsu: CatalogBuilder::seeded(kotatsu),
        }
    }

    pub fn merge_tachiyomi(&mut self, live: impl IntoIterator<Item = CatalogEntry>) -> usize {
        self.tachiyomi.merge(live)
    }

    pub fn merge_kotatsu(&mut self, live: impl IntoIterator<Item = CatalogEntry>) -> usize {
        self.kotatsu.merge(live)
    }

    pub fn build(self) -> Registry {
        Registry {
            tachiyomi: self.tachiyomi.build(),
            kotatsu: self.kotatsu.build(),
        }
    }
}
