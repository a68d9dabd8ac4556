//! Built-in knowledge base.
//!
//! Enough of both catalogs to convert the most common libraries offline. Live
//! catalog data is merged on top at startup but never replaces these.

use crate::models::CatalogEntry;

/// Tachiyomi (Keiyoushi) sources: `(source id, name, domain)`.
///
/// The same id may appear more than once when a source moved domains; the
/// current domain comes first.
const TACHIYOMI: &[(&str, &str, &str)] = &[
    ("2499283573021220255", "MangaDex", "mangadex.org"),
    ("2973143899120668045", "MangaSee", "mangasee123.com"),
    ("8985172093557431221", "Bato.to", "bato.to"),
    ("1024627298672457456", "Manganato", "manganato.com"),
    ("6335003343669033128", "Asura Scans", "asuracomic.net"),
    ("6335003343669033128", "Asura Scans", "asuratoon.com"),
];

/// Kotatsu parsers: `(source key, title, domain)`.
const KOTATSU: &[(&str, &str, &str)] = &[
    ("MANGADEX", "MangaDex", "mangadex.org"),
    ("MANGA_SEE", "MangaSee", "mangasee123.com"),
    ("MANGA_LIFE", "MangaLife", "manga4life.com"),
    ("MANGA_LIFE", "MangaLife", "mangalife.us"),
    ("BATO_TO", "Bato.To", "bato.to"),
    ("WEBTOONS", "Webtoons", "webtoons.com"),
    ("MANGANATO", "Manganato", "manganato.com"),
    ("MANGAKAKALOTTV", "Mangakakalot", "mangakakalot.com"),
    ("MANGAPARK", "MangaPark", "mangapark.net"),
    ("ASURA_SCANS", "Asura Scans", "asuracomic.net"),
    ("ASURA_SCANS", "Asura Scans", "asuratoon.com"),
    ("FLAME_COMICS", "Flame Comics", "flamecomics.com"),
    ("REAPER_SCANS", "Reaper Scans", "reaperscans.com"),
    ("TCB_SCANS", "TCB Scans", "tcbscans.com"),
    ("NHENTAI", "NHentai", "nhentai.net"),
    ("VIZ", "VIZ", "viz.com"),
    ("TAPAS", "Tapas", "tapas.io"),
    ("BILIBILI", "BiliBili Comics", "bilibilicomics.com"),
    ("LUMINOUS", "Luminous Scans", "luminousscans.com"),
    ("LEVIATAN", "Leviatan Scans", "leviatanscans.com"),
    ("DRAKE", "Drake Scans", "drakescans.com"),
    ("RESET", "Reset Scans", "reset-scans.com"),
    ("XCALIBR", "Xcalibr Scans", "xcalibrscans.com"),
    ("OZUL", "Ozul Scans", "ozulscans.com"),
    ("VOID", "Void Scans", "void-scans.com"),
    ("COSMIC", "Cosmic Scans", "cosmicscans.com"),
    ("SURYA", "Surya Scans", "suryascans.com"),
];

fn entries(table: &[(&str, &str, &str)]) -> Vec<CatalogEntry> {
    table.iter().map(|(id, name, domain)| CatalogEntry::new(*id, *name, Some(*domain))).collect()
}

pub fn tachiyomi() -> Vec<CatalogEntry> {
    entries(TACHIYOMI)
}

pub fn kotatsu() -> Vec<CatalogEntry> {
    entries(KOTATSU)
}
