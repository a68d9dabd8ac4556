//! Catalog indexes.
//!
//! A [`Catalog`] is one application's view of the sources it knows about,
//! indexed four ways: by canonical id, by domain, by lowercased display name and
//! by sanitized display name. Catalogs are assembled with a [`CatalogBuilder`]
//! (static seed first, then any live data) and are read-only afterwards.

use crate::models::{CatalogEntry, Origin};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

#[derive(Debug, Clone, Copy)]
struct Slot {
    index: usize,
    origin: Origin,
}

/// Builds a [`Catalog`].
///
/// Key ownership rules, applied independently to each of the four indexes:
///
/// - A key claimed by a [`Origin::Seed`] entry is never overwritten by live
///   data, and the first seed entry to claim a key keeps it.
/// - A key claimed only by live data is overwritten by later live entries.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entries: Vec<CatalogEntry>,
    by_id: HashMap<String, Slot>,
    by_domain: HashMap<String, Slot>,
    by_lower_name: HashMap<String, Slot>,
    by_sanitized_name: HashMap<String, Slot>,
}
impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a builder from the static knowledge base.
    pub fn seeded(seed: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut builder = Self::new();
        for entry in seed {
            builder.insert(entry, Origin::Seed);
        }
        builder
    }

    /// Merge live entries without disturbing keys owned by the seed.
    ///
    /// Returns how many of the live entries claimed at least one key.
    pub fn merge(&mut self, live: impl IntoIterator<Item = CatalogEntry>) -> usize {
        live.into_iter().filter(|entry| self.insert(entry.clone(), Origin::Live)).count()
    }

    /// Register a single entry, returning `true` if it claimed at least one key.
    pub fn insert(&mut self, entry: CatalogEntry, origin: Origin) -> bool {
        let slot = Slot {
            index: self.entries.len(),
            origin,
        };
        let lower_name = entry.display_name.trim().to_lowercase();
        let mut claimed = claim(&mut self.by_id, &entry.canonical_id, slot);
        if let Some(domain) = &entry.domain {
            claimed |= claim(&mut self.by_domain, domain, slot);
        }
        claimed |= claim(&mut self.by_lower_name, &lower_name, slot);
        claimed |= claim(&mut self.by_sanitized_name, &entry.sanitized_name, slot);
        // Entries that claimed nothing are still kept: the fuzzy tier scans
        // every registered entry, not just the indexed ones.
        self.entries.push(entry);
        claimed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the builder into a read-only [`Catalog`].
    pub fn build(self) -> Catalog {
        fn flatten(map: HashMap<String, Slot>) -> HashMap<String, usize> {
            map.into_iter().map(|(key, slot)| (key, slot.index)).collect()
        }
        Catalog {
            entries: self.entries,
            by_id: flatten(self.by_id),
            by_domain: flatten(self.by_domain),
            by_lower_name: flatten(self.by_lower_name),
            by_sanitized_name: flatten(self.by_sanitized_name),
        }
    }
}

fn claim(map: &mut HashMap<String, Slot>, key: &str, slot: Slot) -> bool {
    if key.is_empty() {
        return false;
    }
    match map.entry(key.to_string()) {
        Entry::Vacant(vacant) => {
            vacant.insert(slot);
            true
        },
        Entry::Occupied(mut occupied) => match occupied.get().origin {
            Origin::Live => {
                occupied.insert(slot);
                true
            },
            Origin::Seed => false,
        },
    }
}

/// A read-only, four-way index over one application's sources.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_id: HashMap<String, usize>,
    by_domain: HashMap<String, usize>,
    by_lower_name: HashMap<String, usize>,
    by_sanitized_name: HashMap<String, usize>,
}
impl Catalog {
    /// Shorthand for a catalog made only of seed entries.
    pub fn from_seed(seed: impl IntoIterator<Item = CatalogEntry>) -> Self {
        CatalogBuilder::seeded(seed).build()
    }

    pub fn by_id(&self, id: &str) -> Option<&CatalogEntry> {
        self.lookup(&self.by_id, id)
    }

    /// Look up by an already-canonical domain.
    pub fn by_domain(&self, domain: &str) -> Option<&CatalogEntry> {
        self.lookup(&self.by_domain, domain)
    }

    /// Look up by display name; the argument is lowercased for you.
    pub fn by_lower_name(&self, name: &str) -> Option<&CatalogEntry> {
        self.lookup(&self.by_lower_name, &name.trim().to_lowercase())
    }

    /// Look up by an already-sanitized name.
    pub fn by_sanitized_name(&self, sanitized: &str) -> Option<&CatalogEntry> {
        self.lookup(&self.by_sanitized_name, sanitized)
    }

    /// All entries in registration order (seed first, then live data).
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, map: &HashMap<String, usize>, key: &str) -> Option<&CatalogEntry> {
        map.get(key).and_then(|index| self.entries.get(*index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str, domain: Option<&str>) -> CatalogEntry {
        CatalogEntry::new(id, name, domain)
    }

    #[test]
    fn test_four_way_lookup() {
        let catalog = Catalog::from_seed([entry("1", "Asura Scans", Some("asuracomic.net"))]);
        assert_eq!(catalog.by_id("1").unwrap().display_name, "Asura Scans");
        assert_eq!(catalog.by_domain("asuracomic.net").unwrap().canonical_id, "1");
        assert_eq!(catalog.by_lower_name("ASURA SCANS").unwrap().canonical_id, "1");
        assert_eq!(catalog.by_sanitized_name("asura").unwrap().canonical_id, "1");
        assert!(catalog.by_id("2").is_none());
        assert!(catalog.by_domain("asura.net").is_none());
    }

    #[test]
    fn test_live_never_overrides_seed() {
        let mut builder = CatalogBuilder::seeded([entry("1", "MangaDex", Some("mangadex.org"))]);
        let claimed = builder.merge([entry("999", "Noisy MangaDex Mirror", Some("mangadex.org"))]);
        // The live entry still claims its own id and names.
        assert_eq!(claimed, 1);
        let catalog = builder.build();
        assert_eq!(catalog.by_domain("mangadex.org").unwrap().canonical_id, "1");
        assert_eq!(catalog.by_id("999").unwrap().display_name, "Noisy MangaDex Mirror");
    }

    #[test]
    fn test_live_fills_gaps_last_writer_wins() {
        let mut builder = CatalogBuilder::seeded([entry("1", "MangaDex", Some("mangadex.org"))]);
        builder.merge([entry("2", "Bato", Some("bato.to")), entry("3", "Bato v2", Some("bato.to"))]);
        let catalog = builder.build();
        assert_eq!(catalog.by_domain("bato.to").unwrap().canonical_id, "3");
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_entirely_shadowed_live_entry() {
        let mut builder = CatalogBuilder::seeded([entry("1", "MangaDex", Some("mangadex.org"))]);
        let claimed = builder.merge([entry("1", "mangadex", Some("mangadex.org"))]);
        assert_eq!(claimed, 0);
        // Shadowed, but still visible to a full scan.
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_domain_aliases_share_id() {
        let catalog = Catalog::from_seed([
            entry("42", "Asura Scans", Some("asuracomic.net")),
            entry("42", "Asura Scans", Some("asuratoon.com")),
        ]);
        assert_eq!(catalog.by_domain("asuracomic.net").unwrap().canonical_id, "42");
        assert_eq!(catalog.by_domain("asuratoon.com").unwrap().canonical_id, "42");
        assert_eq!(catalog.by_id("42").unwrap().domain.as_deref(), Some("asuracomic.net"));
    }

    #[test]
    fn test_empty_keys_not_indexed() {
        let catalog = Catalog::from_seed([entry("", "", None)]);
        assert!(catalog.by_id("").is_none());
        assert!(catalog.by_sanitized_name("").is_none());
        assert_eq!(catalog.len(), 1);
    }
}
