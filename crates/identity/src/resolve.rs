//! Source identity resolution.
//!
//! Matching runs as a cascade of tiers; the first tier to produce a match wins:
//!
//! 1. **Domain**: the canonical domain of the content URL (or of the source's
//!    entry in the other catalog) is indexed in the target catalog.
//! 2. **Exact**: the display name matches case-insensitively.
//! 3. **Sanitized**: the [sanitized](crate::sanitize) names are equal.
//! 4. **Fuzzy**: the best [`similarity`] score across every entry of the target
//!    catalog exceeds the acceptance threshold.
//! 5. **Fallback**: a synthetic identity. Forward resolution hashes the name
//!    with [`hash_id`]; backward resolution transliterates the domain or name
//!    into a constant-style key.
//!
//! Resolution never fails and never teaches the registry anything: resolving
//! the same reference twice against the same registry gives the same answer.

use crate::catalog::Catalog;
use crate::domain::canonicalize_opt;
use crate::hash::{DEFAULT_SEED, hash_id};
use crate::models::{CatalogEntry, SourceIdentity};
use crate::registry::Registry;
use crate::sanitize::sanitize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::instrument;

/// Default fuzzy acceptance threshold; a score must be strictly greater.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 70.0;

const SCORE_EXACT: f64 = 100.0;
const SCORE_CONTAINS: f64 = 40.0;
const SCORE_DISTANCE: f64 = 60.0;

/// Which tier of the cascade produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Domain,
    Exact,
    Sanitized,
    Fuzzy,
    Fallback,
}
impl Tier {
    pub const ALL: [Tier; 5] = [Tier::Domain, Tier::Exact, Tier::Sanitized, Tier::Fuzzy, Tier::Fallback];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Domain => "domain",
            Tier::Exact => "exact",
            Tier::Sanitized => "sanitized",
            Tier::Fuzzy => "fuzzy",
            Tier::Fallback => "fallback",
        }
    }
}
impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// A resolved identity and the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub identity: SourceIdentity,
    pub tier: Tier,
}
impl Resolution {
    fn matched(entry: &CatalogEntry, tier: Tier) -> Self {
        Self {
            identity: entry.identity(),
            tier,
        }
    }
}

/// Resolves source references between the two catalogs of a [`Registry`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    registry: &'r Registry,
    threshold: f64,
    seed: i64,
}
impl<'r> Resolver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            threshold: DEFAULT_FUZZY_THRESHOLD,
            seed: DEFAULT_SEED,
        }
    }

    /// Override the fuzzy acceptance threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Override the seed used for synthetic identifiers.
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// Kotatsu → Tachiyomi: resolve a declared source name (and optionally a
    /// sample content URL) to a Tachiyomi source id.
    #[instrument(level = "debug", skip(self), fields(tier))]
    pub fn resolve_from_name_and_url(&self, name: &str, url: Option<&str>) -> Resolution {
        let target = self.registry.tachiyomi();
        let url_domain = canonicalize_opt(url);
        let bridged_domain = self.registry.kotatsu().by_id(name.trim()).and_then(|entry| entry.domain.clone());
        let sanitized = sanitize(name);

        let resolution = Self::domain_tier(target, [url_domain.as_deref(), bridged_domain.as_deref()])
            .or_else(|| target.by_lower_name(name).map(|e| Resolution::matched(e, Tier::Exact)))
            .or_else(|| Self::sanitized_tier(target, &sanitized, false))
            .or_else(|| self.fuzzy_tier(target, &sanitized))
            .unwrap_or_else(|| {
                let id = hash_id(self.seed, name);
                tracing::warn!(source = name, id, "No catalog match for source; using synthetic id");
                Resolution {
                    identity: SourceIdentity::new(id.to_string(), name, url_domain),
                    tier: Tier::Fallback,
                }
            });
        tracing::Span::current().record("tier", resolution.tier.as_str());
        resolution
    }

    /// Tachiyomi → Kotatsu: resolve a Tachiyomi source id, its display name and
    /// optionally a content URL to a Kotatsu source key.
    #[instrument(level = "debug", skip(self), fields(tier))]
    pub fn resolve_to_target_key(&self, canonical_id: &str, display_name: &str, url: Option<&str>) -> Resolution {
        let target = self.registry.kotatsu();
        // Every domain the other catalog knows for this id (sources that moved
        // domains are registered once per domain), then the URL's own domain.
        let mut domains: Vec<String> = self
            .registry
            .tachiyomi()
            .entries()
            .iter()
            .filter(|entry| entry.canonical_id == canonical_id)
            .filter_map(|entry| entry.domain.clone())
            .collect();
        domains.extend(canonicalize_opt(url));
        let sanitized = sanitize(display_name);

        let resolution = Self::domain_tier(target, domains.iter().map(|d| Some(d.as_str())))
            .or_else(|| {
                target
                    .by_lower_name(display_name)
                    .or_else(|| target.by_id(&constant_key(display_name)))
                    .map(|e| Resolution::matched(e, Tier::Exact))
            })
            .or_else(|| Self::sanitized_tier(target, &sanitized, true))
            .or_else(|| self.fuzzy_tier(target, &sanitized))
            .unwrap_or_else(|| {
                let domain = domains.first().cloned();
                let key = match (&domain, display_name.trim()) {
                    (Some(domain), _) => constant_key(domain.split('.').next().unwrap_or(domain)),
                    (None, "") => constant_key(canonical_id),
                    (None, name) => constant_key(name),
                };
                tracing::warn!(
                    source = display_name,
                    id = canonical_id,
                    key = %key,
                    "No catalog match for source; using derived key"
                );
                Resolution {
                    identity: SourceIdentity::new(key, display_name, domain),
                    tier: Tier::Fallback,
                }
            });
        tracing::Span::current().record("tier", resolution.tier.as_str());
        resolution
    }

    fn domain_tier<'a>(target: &Catalog, domains: impl IntoIterator<Item = Option<&'a str>>) -> Option<Resolution> {
        domains
            .into_iter()
            .flatten()
            .find_map(|domain| target.by_domain(domain))
            .map(|e| Resolution::matched(e, Tier::Domain))
    }

    /// With `match_keys`, also compare against the sanitized canonical ids of
    /// the target catalog (Kotatsu keys such as `ASURA_SCANS` read like names).
    fn sanitized_tier(target: &Catalog, sanitized: &str, match_keys: bool) -> Option<Resolution> {
        if sanitized.is_empty() {
            return None;
        }
        target
            .by_sanitized_name(sanitized)
            .or_else(|| match match_keys {
                true => target.entries().iter().find(|e| sanitize(&e.canonical_id) == sanitized),
                false => None,
            })
            .map(|e| Resolution::matched(e, Tier::Sanitized))
    }

    fn fuzzy_tier(&self, target: &Catalog, sanitized: &str) -> Option<Resolution> {
        let (entry, score) = best_match(target.entries(), sanitized)?;
        if score <= self.threshold {
            tracing::debug!(
                candidate = %entry.display_name,
                score,
                threshold = self.threshold,
                "Fuzzy candidate rejected"
            );
            return None;
        }
        tracing::debug!(candidate = %entry.display_name, score, "Fuzzy match accepted");
        Some(Resolution::matched(entry, Tier::Fuzzy))
    }
}

/// The highest-scoring entry for a sanitized name; ties go to the entry
/// registered first.
pub fn best_match<'c>(entries: &'c [CatalogEntry], sanitized: &str) -> Option<(&'c CatalogEntry, f64)> {
    if sanitized.is_empty() {
        return None;
    }
    let mut best: Option<(&CatalogEntry, f64)> = None;
    for entry in entries.iter().filter(|e| !e.sanitized_name.is_empty()) {
        let score = similarity(sanitized, &entry.sanitized_name);
        if best.is_none_or(|(_, current)| score > current) {
            best = Some((entry, score));
        }
    }
    best
}

/// Similarity of two sanitized names, from 0 to 200:
/// `100·[equal] + 40·[one contains the other] + 60·(1 − distance / longest)`.
///
/// # Examples
///
/// ```
/// use shelf_identity::resolve::similarity;
/// assert_eq!(similarity("asura", "asura"), 200.0);
/// assert_eq!(similarity("abc", "xyz"), 0.0);
/// assert_eq!(similarity("", "asura"), 0.0);
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let exact = if a == b { SCORE_EXACT } else { 0.0 };
    let contains = if a.contains(b) || b.contains(a) { SCORE_CONTAINS } else { 0.0 };
    let longest = a.chars().count().max(b.chars().count());
    let closeness = 1.0 - levenshtein(a, b) as f64 / longest as f64;
    exact + contains + SCORE_DISTANCE * closeness
}

/// Edit distance (insertions, deletions, substitutions) over `char`s.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Transliterate into a Kotatsu-style constant key: ASCII uppercase, anything
/// that isn't an ASCII letter or digit becomes `_`.
///
/// # Examples
///
/// ```
/// use shelf_identity::resolve::constant_key;
/// assert_eq!(constant_key("Bato.to"), "BATO_TO");
/// assert_eq!(constant_key("Asura Scans"), "ASURA_SCANS");
/// ```
pub fn constant_key(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c.is_ascii_alphanumeric() {
            true => c.to_ascii_uppercase(),
            false => '_',
        })
        .collect()
}
