//! Doki parser repository (Kotatsu sources).
//!
//! There is no published index, so the parser sources themselves are read: the
//! repository tree is listed once, then every Kotlin file under
//! `src/main/kotlin` is downloaded and scraped for its
//! `@MangaSourceParser("KEY", "Title")` annotation and its domain.

use crate::error::{ErrorKind, Result};
use crate::fetch::{Fetch, json};
use exn::ResultExt;
use futures::future::join_all;
use regex::Regex;
use serde::Deserialize;
use shelf_identity::{CatalogEntry, canonicalize};
use std::sync::LazyLock;
use tracing::instrument;
use url::Url;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(PARSER_ANNOTATION, r#"@MangaSourceParser\(\s*"([A-Za-z0-9_]+)"\s*,\s*"([^"]*)""#);
regex!(CONFIG_DOMAIN, r"ConfigKey\.Domain\(([^)]*)\)");
// Template subclasses pass their domain straight to the parent constructor:
// `MadaraParser(context, MangaParserSource.FOO, "foo.com", 10)`
regex!(TEMPLATE_DOMAIN, r#"MangaParserSource\.[A-Za-z0-9_]+\s*,\s*"([^"]+)""#);
regex!(BASE_URL, r#"override\s+val\s+baseUrl\s*=\s*"([^"]+)""#);
regex!(ANY_URL, r#""(https?://[^"\s]+)""#);
regex!(QUOTED, r#""([^"]+)""#);

const SOURCE_ROOT: &str = "src/main/kotlin";

#[derive(Debug, Deserialize)]
struct Tree {
    #[serde(default)]
    tree: Vec<TreeNode>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeNode {
    path: String,
    #[serde(rename = "type", default)]
    kind: String,
}
impl TreeNode {
    fn is_parser_source(&self) -> bool {
        self.kind != "tree" && self.path.ends_with(".kt") && self.path.contains(SOURCE_ROOT)
    }
}

/// List the repository, then download and scrape every parser source in
/// batches of `batch_size` concurrent requests.
///
/// Only the tree listing can fail the whole fetch; individual files that fail
/// to download are skipped.
#[instrument(level = "debug", skip(fetcher), fields(files))]
pub async fn fetch(
    fetcher: &dyn Fetch,
    tree_url: &Url,
    raw_base: &Url,
    batch_size: usize,
) -> Result<Vec<CatalogEntry>> {
    let tree: Tree = json(fetcher, tree_url).await?;
    if tree.truncated {
        tracing::warn!(%tree_url, "Repository listing was truncated; some Kotatsu sources will be missing");
    }
    let files = tree
        .tree
        .iter()
        .filter(|node| node.is_parser_source())
        .map(|node| raw_base.join(&node.path).or_raise(|| ErrorKind::InvalidResponse(tree_url.to_string())))
        .collect::<Result<Vec<Url>>>()?;
    tracing::Span::current().record("files", files.len());

    let mut entries = Vec::new();
    let mut failed = 0usize;
    for batch in files.chunks(batch_size.max(1)) {
        let bodies = join_all(batch.iter().map(|url| fetcher.text(url))).await;
        for (url, body) in batch.iter().zip(bodies) {
            match body {
                Ok(body) => entries.extend(scrape(&body)),
                Err(e) => {
                    tracing::debug!(%url, error = ?e, "Skipping parser source");
                    failed += 1;
                },
            }
        }
    }
    tracing::debug!(entries = entries.len(), failed, "Scraped Doki parser sources");
    Ok(entries)
}

/// Scrape one Kotlin parser source.
///
/// Returns one entry per domain the parser declares (parsers may list mirror
/// domains), or nothing if either the annotation or a domain is missing.
///
/// # Examples
///
/// ```
/// use shelf_catalog::doki::scrape;
///
/// let source = r#"
///     @MangaSourceParser("MANGADEX", "MangaDex")
///     internal class MangaDexParser(context: MangaLoaderContext) : MangaParser(context, MangaParserSource.MANGADEX) {
///         override val configKeyDomain = ConfigKey.Domain("mangadex.org")
///     }
/// "#;
/// let entries = scrape(source);
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].canonical_id, "MANGADEX");
/// assert_eq!(entries[0].domain.as_deref(), Some("mangadex.org"));
/// ```
pub fn scrape(source: &str) -> Vec<CatalogEntry> {
    let Some(annotation) = PARSER_ANNOTATION.captures(source) else {
        return Vec::new();
    };
    let key = &annotation[1];
    let title = match annotation[2].trim() {
        "" => key,
        title => title,
    };
    domains(source)
        .iter()
        .map(|domain| CatalogEntry::new(key, title, Some(domain)))
        .collect()
}

/// Domains in order of preference; the first strategy that yields anything
/// wins.
fn domains(source: &str) -> Vec<String> {
    let configured: Vec<String> = CONFIG_DOMAIN
        .captures(source)
        .map(|args| QUOTED.captures_iter(&args[1]).filter_map(|quoted| canonicalize(&quoted[1])).collect())
        .unwrap_or_default();
    if !configured.is_empty() {
        return configured;
    }
    [&TEMPLATE_DOMAIN, &BASE_URL, &ANY_URL]
        .into_iter()
        .find_map(|pattern| pattern.captures(source).and_then(|c| canonicalize(&c[1])))
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFetcher;
    use rstest::rstest;

    const TREE_URL: &str = "https://api.github.com/repos/DokiTeam/doki-exts/git/trees/base?recursive=1";
    const RAW_BASE: &str = "https://raw.githubusercontent.com/DokiTeam/doki-exts/base/";

    #[rstest]
    #[case::config_domain(
        r#"@MangaSourceParser("MANGADEX", "MangaDex")
        class X { override val configKeyDomain = ConfigKey.Domain("mangadex.org") }"#,
        &["mangadex.org"]
    )]
    #[case::mirror_domains(
        r#"@MangaSourceParser("MANGA_LIFE", "MangaLife")
        class X { override val configKeyDomain = ConfigKey.Domain("manga4life.com", "www.mangalife.us") }"#,
        &["manga4life.com", "mangalife.us"]
    )]
    #[case::template(
        r#"@MangaSourceParser("ASURA_SCANS", "Asura Scans", "en")
        internal class AsuraScans(context: MangaLoaderContext) :
            MadaraParser(context, MangaParserSource.ASURA_SCANS, "asuracomic.net", 10)"#,
        &["asuracomic.net"]
    )]
    #[case::base_url(
        r#"@MangaSourceParser("VIZ", "VIZ")
        class X { override val baseUrl = "https://www.viz.com" }"#,
        &["viz.com"]
    )]
    #[case::any_url(
        r#"@MangaSourceParser("TAPAS", "Tapas")
        class X { fun api() = "https://tapas.io/api/v2" }"#,
        &["tapas.io"]
    )]
    #[case::config_beats_url(
        r#"@MangaSourceParser("FLAME_COMICS", "Flame Comics")
        class X {
            val cdn = "https://cdn.flamecomics.xyz"
            override val configKeyDomain = ConfigKey.Domain("flamecomics.com")
        }"#,
        &["flamecomics.com"]
    )]
    fn test_scrape(#[case] source: &str, #[case] expected: &[&str]) {
        let entries = scrape(source);
        let domains: Vec<&str> = entries.iter().filter_map(|e| e.domain.as_deref()).collect();
        assert_eq!(domains, expected);
    }

    #[rstest]
    #[case::no_annotation(r#"class Helper { val url = "https://example.com" }"#)]
    #[case::no_domain(r#"@MangaSourceParser("LOCAL", "Local") class X"#)]
    fn test_scrape_nothing(#[case] source: &str) {
        assert!(scrape(source).is_empty());
    }

    #[test]
    fn test_scrape_empty_title_uses_key() {
        let entries = scrape(r#"@MangaSourceParser("NHENTAI", "") ConfigKey.Domain("nhentai.net")"#);
        assert_eq!(entries[0].display_name, "NHENTAI");
    }

    #[tokio::test]
    async fn test_fetch_in_batches() {
        let tree = r#"{"truncated": false, "tree": [
            {"path": "src/main/kotlin", "type": "tree"},
            {"path": "src/main/kotlin/site/A.kt", "type": "blob"},
            {"path": "src/main/kotlin/site/B.kt", "type": "blob"},
            {"path": "src/main/kotlin/site/C.kt", "type": "blob"},
            {"path": "src/main/kotlin/site/Missing.kt", "type": "blob"},
            {"path": "src/test/kotlin/site/T.kt", "type": "blob"},
            {"path": "README.md", "type": "blob"}
        ]}"#;
        let fetcher = MockFetcher::with_responses([
            (TREE_URL.to_string(), tree.to_string()),
            (
                format!("{RAW_BASE}src/main/kotlin/site/A.kt"),
                r#"@MangaSourceParser("ALPHA", "Alpha") ConfigKey.Domain("alpha.com")"#.to_string(),
            ),
            (
                format!("{RAW_BASE}src/main/kotlin/site/B.kt"),
                r#"@MangaSourceParser("BETA", "Beta") ConfigKey.Domain("beta.com")"#.to_string(),
            ),
            (format!("{RAW_BASE}src/main/kotlin/site/C.kt"), "object Utils".to_string()),
        ]);
        let tree_url = Url::parse(TREE_URL).unwrap();
        let raw_base = Url::parse(RAW_BASE).unwrap();
        let entries = fetch(&fetcher, &tree_url, &raw_base, 3).await.unwrap();
        let keys: Vec<&str> = entries.iter().map(|e| e.canonical_id.as_str()).collect();
        assert_eq!(keys, ["ALPHA", "BETA"]);
        // Listing plus four parser sources; tests and docs are never downloaded.
        assert_eq!(fetcher.requests().await.len(), 5);
    }

    #[tokio::test]
    async fn test_fetch_fails_without_listing() {
        let fetcher = MockFetcher::default();
        let result = fetch(&fetcher, &Url::parse(TREE_URL).unwrap(), &Url::parse(RAW_BASE).unwrap(), 10).await;
        assert!(result.is_err());
    }
}
