//! Source name sanitization.
//!
//! Display names drift between catalogs ("Asura Scans", "Asura Toon",
//! "asuracomic.net", "Asura (EN)"). Sanitizing reduces them to a lowercase
//! alphanumeric token so the resolver can compare them leniently.

/// Top-level domains stripped when a display name is really a hostname.
const TLDS: &[&str] = &[
    "com", "net", "org", "io", "co", "to", "me", "gg", "cc", "xyz", "fm", "site", "club", "live", "world", "app",
    "dev", "tech", "space", "top", "online", "info", "biz", "eu", "us", "uk", "ca", "au", "ru", "jp", "br", "es",
    "fr", "de", "it", "nl", "pl", "in", "vn", "id", "th", "tw", "cn", "kr", "my", "ph", "sg", "ink", "wiki", "moe",
];

/// Language markers, stripped before [`ROLE_WORDS`].
const LANGUAGE_MARKERS: &[&str] = &["(english)", "(eng)", "(en)", "english", "(id)", "(es)", "(pt-br)", "(all)"];

/// Trailing words describing what a group *does* rather than who it is.
///
/// Longer words come before their prefixes ("scans" before "scan").
const ROLE_WORDS: &[&str] = &["scans", "scan", "comics", "comic", "team", "fansub", "toon"];

/// Sanitize a source display name into a comparable token.
///
/// Lower-cases, strips a trailing TLD, then language markers, then role words
/// (repeatedly, so "Foo Scans Team" reduces fully), and finally removes all
/// non-alphanumeric characters. A noise word is only stripped at a word
/// boundary and only if something would remain.
///
/// # Examples
///
/// ```
/// use shelf_identity::sanitize;
/// assert_eq!(sanitize("Foo Scans (EN)"), "foo");
/// assert_eq!(sanitize("FOO-SCANS"), "foo");
/// assert_eq!(sanitize("mangadex.org"), "mangadex");
/// assert_eq!(sanitize("Webtoons"), "webtoons");
/// assert_eq!(sanitize(""), "");
/// ```
pub fn sanitize(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let mut s = strip_tld(&lowered);
    s = strip_all(s, LANGUAGE_MARKERS);
    s = strip_all(s, ROLE_WORDS);
    s.chars().filter(|c| c.is_alphanumeric()).collect()
}

fn strip_tld(s: &str) -> &str {
    if let Some((head, tld)) = s.rsplit_once('.')
        && !head.is_empty()
        && !head.contains(char::is_whitespace)
        && TLDS.contains(&tld)
    {
        return head;
    }
    s
}

/// Repeatedly strip any of `tokens` from the end of `s` until none apply.
fn strip_all<'a>(mut s: &'a str, tokens: &[&str]) -> &'a str {
    'outer: loop {
        s = trim_separators(s);
        for token in tokens {
            if let Some(head) = strip_token(s, token) {
                s = head;
                continue 'outer;
            }
        }
        return s;
    }
}

fn strip_token<'a>(s: &'a str, token: &str) -> Option<&'a str> {
    let head = s.strip_suffix(token)?;
    // Word boundary: the token either starts with punctuation or is preceded
    // by a non-alphanumeric character.
    let bounded = !token.starts_with(char::is_alphanumeric)
        || head.chars().next_back().is_some_and(|c| !c.is_alphanumeric());
    let head = trim_separators(head);
    (bounded && head.chars().any(char::is_alphanumeric)).then_some(head)
}

fn trim_separators(s: &str) -> &str {
    s.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '(' && c != ')')
}
