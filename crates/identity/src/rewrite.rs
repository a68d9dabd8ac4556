//! Per-source URL rewriting.
//!
//! The two applications don't always store the same URL for the same manga:
//! Tachiyomi extensions mostly store a path relative to the source's base URL,
//! Kotatsu parsers store whatever their parser finds convenient (MangaDex, for
//! example, stores the bare UUID). Rewrites are pure functions keyed by the
//! Tachiyomi source id.

use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

/// A pure `(url) -> url` transformation.
pub type Rewrite = fn(&str) -> String;

/// URL rewrites for one source, in both directions.
#[derive(Clone, Copy)]
pub struct UrlRewrite {
    pub manga_to_tachiyomi: Rewrite,
    pub manga_to_kotatsu: Rewrite,
    pub chapter_to_tachiyomi: Rewrite,
    pub chapter_to_kotatsu: Rewrite,
}
impl std::fmt::Debug for UrlRewrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UrlRewrite")
    }
}

/// Applied to every source without a dedicated entry.
pub static DEFAULT_REWRITE: UrlRewrite = UrlRewrite {
    manga_to_tachiyomi: strip_origin,
    manga_to_kotatsu: unchanged,
    chapter_to_tachiyomi: strip_origin,
    chapter_to_kotatsu: unchanged,
};

const MANGADEX_ID: &str = "2499283573021220255";

static REWRITES: LazyLock<HashMap<&'static str, UrlRewrite>> = LazyLock::new(|| {
    HashMap::from([(
        MANGADEX_ID,
        UrlRewrite {
            manga_to_tachiyomi: |url| format!("/manga/{}", mangadex_uuid(url)),
            manga_to_kotatsu: |url| mangadex_uuid(url).to_string(),
            chapter_to_tachiyomi: |url| format!("/chapter/{}", mangadex_uuid(url)),
            chapter_to_kotatsu: |url| mangadex_uuid(url).to_string(),
        },
    )])
});

/// Returns the rewrite table entry for a Tachiyomi source id.
pub fn rewrite_for(tachiyomi_id: &str) -> &'static UrlRewrite {
    REWRITES.get(tachiyomi_id).unwrap_or(&DEFAULT_REWRITE)
}

fn unchanged(url: &str) -> String {
    url.to_string()
}

/// Reduce an absolute URL to its path (and query); leave anything else alone.
fn strip_origin(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if parsed.has_host() => match parsed.query() {
            Some(query) => format!("{}?{query}", parsed.path()),
            None => parsed.path().to_string(),
        },
        _ => url.to_string(),
    }
}

/// `https://mangadex.org/title/<uuid>/<slug>`, `/manga/<uuid>` and `<uuid>` all
/// reduce to `<uuid>`.
fn mangadex_uuid(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.iter().position(|s| matches!(*s, "title" | "manga" | "chapter")) {
        Some(i) if i + 1 < segments.len() => segments[i + 1],
        _ => segments.last().copied().unwrap_or(url),
    }
}
