//! Tachiyomi side of the transcoder.

use crate::models::{
    Category, ChapterEntry, DeclaredSource, HistoryRecord, Library, LibraryEntry, Status, Summary, chapter_number,
};
use shelf_backup::tachiyomi::{Backup, BackupCategory, BackupChapter, BackupHistory, BackupManga, BackupSource};
use shelf_identity::{Resolver, hash_id, parse_source_id};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::instrument;

/// Build the neutral library from a Tachiyomi backup. `now` stands in for
/// missing dates.
#[instrument(level = "debug", skip_all, fields(manga = backup.backup_manga.len()))]
pub fn read(backup: &Backup, now: i64) -> Library {
    let names: HashMap<i64, &str> = backup.backup_sources.iter().map(|s| (s.source_id, s.name.as_str())).collect();

    let mut sorted: Vec<&BackupCategory> = backup.backup_categories.iter().collect();
    sorted.sort_by_key(|category| category.order);
    // Memberships name a category by its order. Where orders collide, members
    // join the first category in rank.
    let mut ranks: HashMap<i64, i64> = HashMap::new();
    for (category, rank) in sorted.iter().zip(0..) {
        match ranks.entry(category.order) {
            Entry::Vacant(slot) => {
                slot.insert(rank);
            },
            Entry::Occupied(_) => {
                tracing::debug!(name = %category.name, order = category.order, "Category order is used twice");
            },
        }
    }
    let categories = sorted
        .iter()
        .zip(0..)
        .map(|(c, order)| Category {
            name: c.name.clone(),
            order,
        })
        .collect();

    let entries = backup
        .backup_manga
        .iter()
        .map(|manga| {
            let chapters: Vec<ChapterEntry> = manga
                .chapters
                .iter()
                .map(|chapter| ChapterEntry {
                    url: chapter.url.clone(),
                    name: chapter.name.clone(),
                    scanlator: chapter.scanlator.clone().filter(|s| !s.trim().is_empty()),
                    chapter_number: chapter_number(chapter.chapter_number),
                    read: chapter.read,
                    bookmark: chapter.bookmark,
                    last_page_read: chapter.last_page_read,
                    date_fetch: chapter.date_fetch,
                    date_upload: chapter.date_upload,
                    source_order: chapter.source_order,
                })
                .collect();
            let history = manga
                .history
                .iter()
                .map(|record| HistoryRecord {
                    chapter_url: Some(record.url.clone()).filter(|url| !url.is_empty()),
                    last_read: record.last_read,
                    page: chapters
                        .iter()
                        .find(|c| c.url == record.url)
                        .map(|c| c.last_page_read)
                        .unwrap_or_default(),
                    percent: 0.0,
                })
                .collect();
            let categories: BTreeSet<i64> =
                manga.categories.iter().filter_map(|order| ranks.get(order)).copied().collect();
            if categories.len() < manga.categories.len() {
                tracing::debug!(title = %manga.title, "Manga references an unknown category");
            }
            LibraryEntry {
                title: manga.title.clone(),
                url: manga.url.clone(),
                author: non_blank(manga.author.as_ref()),
                artist: non_blank(manga.artist.as_ref()),
                description: non_blank(manga.description.as_ref()),
                tags: manga.genre.iter().filter(|g| !g.trim().is_empty()).cloned().collect(),
                status: Status::from_tachiyomi(manga.status),
                thumbnail_url: non_blank(manga.thumbnail_url.as_ref()),
                date_added: if manga.date_added > 0 { manga.date_added } else { now },
                source: DeclaredSource {
                    id: manga.source.to_string(),
                    name: names.get(&manga.source).copied().unwrap_or_default().to_string(),
                    url: Some(manga.url.clone()).filter(|url| url.contains("://")),
                },
                categories,
                chapters,
                history,
            }
        })
        .collect();
    Library { categories, entries }
}

/// Write the library as a Tachiyomi backup, resolving every entry's declared
/// (Kotatsu) source to a Tachiyomi source id.
#[instrument(level = "debug", skip_all, fields(entries = library.entries.len()))]
pub fn write(library: &Library, resolver: &Resolver<'_>) -> (Backup, Summary) {
    let registry = resolver.registry();
    let mut summary = Summary::default();
    let mut seen = HashSet::new();
    let mut backup = Backup {
        backup_categories: library
            .categories
            .iter()
            .map(|category| BackupCategory {
                name: category.name.clone(),
                order: category.order,
                flags: 0,
            })
            .collect(),
        ..Backup::default()
    };

    for entry in &library.entries {
        let resolution = resolver.resolve_from_name_and_url(&entry.source.name, entry.source.url.as_deref());
        summary.record(resolution.tier);
        let identity = resolution.identity;
        let source = parse_source_id(&identity.canonical_id).unwrap_or_else(|e| {
            tracing::warn!(id = %identity.canonical_id, error = ?e, "Catalog id is not numeric; hashing it");
            hash_id(resolver.seed(), &identity.canonical_id)
        });
        // The first display name seen for an id is the one listed.
        if seen.insert(source) {
            backup.backup_sources.push(BackupSource {
                name: identity.display_name,
                source_id: source,
            });
        }

        let rewrite = registry.url_rewrite(&source.to_string());
        let url = (rewrite.manga_to_tachiyomi)(&entry.url);
        let history = entry.last_read().map(|record| BackupHistory {
            url: match &record.chapter_url {
                Some(chapter_url) => (rewrite.chapter_to_tachiyomi)(chapter_url),
                None => url.clone(),
            },
            last_read: record.last_read,
            read_duration: 0,
        });
        backup.backup_manga.push(BackupManga {
            source,
            url,
            title: entry.title.clone(),
            artist: entry.artist.clone(),
            author: entry.author.clone(),
            description: entry.description.clone(),
            genre: entry.tags.clone(),
            status: entry.status.to_tachiyomi(),
            thumbnail_url: entry.thumbnail_url.clone(),
            date_added: entry.date_added,
            chapters: entry
                .chapters
                .iter()
                .map(|chapter| BackupChapter {
                    url: (rewrite.chapter_to_tachiyomi)(&chapter.url),
                    name: chapter.name.clone(),
                    scanlator: chapter.scanlator.clone(),
                    read: chapter.read,
                    bookmark: chapter.bookmark,
                    last_page_read: chapter.last_page_read,
                    date_fetch: chapter.date_fetch,
                    date_upload: chapter.date_upload,
                    chapter_number: chapter.chapter_number,
                    source_order: chapter.source_order,
                })
                .collect(),
            categories: entry.categories.iter().copied().collect(),
            favorite: true,
            history: history.into_iter().collect(),
        });
    }
    summary.sources = seen.len();
    (backup, summary)
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string)
}
