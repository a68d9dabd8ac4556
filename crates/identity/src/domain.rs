//! Domain canonicalization.
//!
//! Reduces a URL (or a bare hostname) to the part both applications agree on:
//! the hostname without presentation-layer prefixes such as `www.`, `m.` or
//! mirror subdomains like `v2.`.

use tracing::instrument;
use url::Url;

const DEFAULT_SCHEME: &str = "https://";

/// Canonicalize a URL or hostname into a comparable domain.
///
/// Returns `None` for empty input, relative paths, unparseable URLs and URLs
/// without a host.
/// Prefixes are stripped repeatedly so the result is a fixed point, but never
/// down to a single label.
///
/// # Examples
///
/// ```
/// use shelf_identity::canonicalize;
/// assert_eq!(canonicalize("https://www.MangaDex.org/title/abc"), Some("mangadex.org".to_string()));
/// assert_eq!(canonicalize("m.bato.to"), Some("bato.to".to_string()));
/// assert_eq!(canonicalize("https://v2.example.com."), Some("example.com".to_string()));
/// assert_eq!(canonicalize(""), None);
/// ```
#[instrument(level = "trace", ret)]
pub fn canonicalize(url: &str) -> Option<String> {
    let url = url.trim();
    // A bare path would otherwise have its first segment read as a host.
    if url.is_empty() || url.starts_with('/') {
        return None;
    }
    let parsed = match url.contains("://") {
        true => Url::parse(url),
        false => Url::parse(&format!("{DEFAULT_SCHEME}{url}")),
    }
    .ok()?;
    let host = parsed.host_str()?.trim_end_matches('.').to_lowercase();
    let mut host = host.as_str();
    while let Some(stripped) = strip_prefix(host) {
        host = stripped;
    }
    match host.is_empty() {
        true => None,
        false => Some(host.to_string()),
    }
}

/// Convenience wrapper for optional URLs.
pub fn canonicalize_opt(url: Option<&str>) -> Option<String> {
    url.and_then(canonicalize)
}

/// Strip one presentation-layer prefix, if present and if something with at
/// least one dot would remain.
fn strip_prefix(host: &str) -> Option<&str> {
    let (label, rest) = host.split_once('.')?;
    if !rest.contains('.') {
        return None;
    }
    let strippable = match label {
        "www" | "m" => true,
        _ => label.len() > 1 && label.starts_with('v') && label[1..].bytes().all(|b| b.is_ascii_digit()),
    };
    strippable.then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://mangadex.org/title/abc", Some("mangadex.org"))]
    #[case("http://www.mangadex.org", Some("mangadex.org"))]
    #[case("mangadex.org", Some("mangadex.org"))]
    #[case("MANGADEX.ORG", Some("mangadex.org"))]
    #[case("https://m.webtoons.com/en/", Some("webtoons.com"))]
    #[case("https://v1.mangapark.net", Some("mangapark.net"))]
    #[case("https://v12.mangapark.net", Some("mangapark.net"))]
    #[case("https://vip.mangapark.net", Some("vip.mangapark.net"))]
    #[case("https://api.mangadex.org", Some("api.mangadex.org"))]
    #[case("https://www.m.example.com", Some("example.com"))]
    #[case("https://m.www.example.com", Some("example.com"))]
    #[case("https://example.com.:8080/path", Some("example.com"))]
    #[case("https://www.com", Some("www.com"))]
    #[case("bato.to", Some("bato.to"))]
    #[case("", None)]
    #[case("   ", None)]
    #[case("not a url", None)]
    #[case("https://", None)]
    #[case("/manga/abc", None)]
    #[case("//cdn.example.com/x", None)]
    fn test_canonicalize(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(canonicalize(input).as_deref(), expected);
    }

    #[rstest]
    #[case("https://www.mangadex.org/title/abc")]
    #[case("m.m.example.com")]
    #[case("https://v2.www.m.example.co.uk/")]
    #[case("asuracomic.net")]
    #[case("https://192.168.0.1:8080/")]
    fn test_idempotent(#[case] input: &str) {
        let once = canonicalize(input).unwrap();
        assert_eq!(canonicalize(&once).as_deref(), Some(once.as_str()));
    }

    #[test]
    fn test_canonicalize_opt() {
        assert_eq!(canonicalize_opt(None), None);
        assert_eq!(canonicalize_opt(Some("www.bato.to")).as_deref(), Some("bato.to"));
    }
}
