use crate::domain::canonicalize_opt;
use crate::sanitize::sanitize;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// The identity of a content source as one application knows it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceIdentity {
    /// Key the target application uses: a signed 64-bit integer printed as a
    /// string (Tachiyomi) or a constant-style key such as `MANGADEX` (Kotatsu).
    pub canonical_id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Canonical domain, if known.
    pub domain: Option<String>,
}
impl SourceIdentity {
    pub fn new(canonical_id: impl Into<String>, display_name: impl Into<String>, domain: Option<String>) -> Self {
        Self {
            canonical_id: canonical_id.into(),
            display_name: display_name.into(),
            domain,
        }
    }
}
impl Display for SourceIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} ({})", self.display_name, self.canonical_id)
    }
}

/// Where a catalog entry came from.
///
/// Static knowledge outranks live data when both claim the same lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Built-in knowledge base.
    Seed,
    /// Fetched from a remote catalog index during this run.
    Live,
}

/// A single source known to a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub canonical_id: String,
    pub display_name: String,
    pub domain: Option<String>,
    /// [`sanitize`]d form of `display_name`, computed once at construction.
    pub sanitized_name: String,
}
impl CatalogEntry {
    /// Create an entry, canonicalizing `domain` (which may be a full base URL)
    /// and sanitizing the display name.
    pub fn new(canonical_id: impl Into<String>, display_name: impl Into<String>, domain: Option<&str>) -> Self {
        let display_name = display_name.into();
        Self {
            canonical_id: canonical_id.into(),
            sanitized_name: sanitize(&display_name),
            domain: canonicalize_opt(domain),
            display_name,
        }
    }

    pub fn identity(&self) -> SourceIdentity {
        SourceIdentity::new(&self.canonical_id, &self.display_name, self.domain.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_normalizes_fields() {
        let entry = CatalogEntry::new("2499283573021220255", "MangaDex", Some("https://www.mangadex.org/"));
        assert_eq!(entry.domain.as_deref(), Some("mangadex.org"));
        assert_eq!(entry.sanitized_name, "mangadex");
        assert_eq!(entry.identity().to_string(), "MangaDex (2499283573021220255)");
    }

    #[test]
    fn test_entry_invalid_domain() {
        let entry = CatalogEntry::new("X", "X", Some("not a domain"));
        assert_eq!(entry.domain, None);
    }
}
