//! Kotatsu side of the transcoder.
//!
//! Kotatsu stores one `favourites` row per (manga, category) pair, so rows are
//! grouped by `manga_id` on read and fanned back out on write.

use crate::models::{
    Category, ChapterEntry, DeclaredSource, HistoryRecord, Library, LibraryEntry, Status, Summary, UNKNOWN_CHAPTER,
    chapter_number,
};
use shelf_backup::kotatsu::{self as format, Backup, Favourite, History, Manga, Tag};
use shelf_identity::{Resolver, hash_id};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::instrument;

/// Build the neutral library from a Kotatsu backup. `now` stands in for
/// missing dates.
#[instrument(level = "debug", skip_all, fields(favourites = backup.favourites.len()))]
pub fn read(backup: &Backup, now: i64) -> Library {
    let mut sorted: Vec<&format::Category> = backup.categories.iter().collect();
    sorted.sort_by_key(|category| category.sort_key);
    let ranks: HashMap<i64, i64> = sorted.iter().zip(0..).map(|(c, rank)| (c.category_id, rank)).collect();
    let categories = sorted
        .iter()
        .zip(0..)
        .map(|(c, order)| Category {
            name: c.title.clone(),
            order,
        })
        .collect();

    let mut history: HashMap<i64, Vec<&History>> = HashMap::new();
    for record in &backup.history {
        history.entry(record.manga_id).or_default().push(record);
    }

    // First row of each manga, plus every category it appears in.
    let mut groups: Vec<(&Favourite, BTreeSet<i64>, i64)> = Vec::new();
    let mut positions: HashMap<i64, usize> = HashMap::new();
    for favourite in &backup.favourites {
        let position = *positions.entry(favourite.manga_id).or_insert_with(|| {
            groups.push((favourite, BTreeSet::new(), 0));
            groups.len() - 1
        });
        let (_, orders, added) = &mut groups[position];
        match ranks.get(&favourite.category_id) {
            Some(rank) => {
                orders.insert(*rank);
            },
            None if favourite.category_id == 0 => {},
            None => tracing::debug!(
                manga_id = favourite.manga_id,
                category_id = favourite.category_id,
                "Favourite references an unknown category"
            ),
        }
        if favourite.created_at > 0 && (*added == 0 || favourite.created_at < *added) {
            *added = favourite.created_at;
        }
    }

    let fallback = Manga::default();
    let entries = groups
        .into_iter()
        .map(|(favourite, orders, added)| {
            let manga = favourite.manga.as_ref().unwrap_or(&fallback);
            let records = history.get(&favourite.manga_id).map(Vec::as_slice).unwrap_or_default();
            entry(manga, records, orders, if added > 0 { added } else { now }, now)
        })
        .collect();
    Library { categories, entries }
}

fn entry(manga: &Manga, records: &[&History], categories: BTreeSet<i64>, date_added: i64, now: i64) -> LibraryEntry {
    let count = manga.chapters.len();
    let mut chapters: Vec<ChapterEntry> = manga
        .chapters
        .iter()
        .zip(0..)
        .map(|(chapter, index)| ChapterEntry {
            url: chapter.url.clone(),
            name: chapter.name.clone(),
            scanlator: non_blank(chapter.scanlator.as_deref()),
            chapter_number: chapter_number(chapter.number),
            read: chapter.read,
            bookmark: false,
            last_page_read: 0,
            date_fetch: now,
            date_upload: chapter.uploaded_at,
            // Kotatsu lists oldest first; Tachiyomi's source order counts from the newest.
            source_order: i64::try_from(count).unwrap_or(i64::MAX) - 1 - index,
        })
        .collect();

    let history: Vec<HistoryRecord> = records
        .iter()
        .map(|record| HistoryRecord {
            chapter_url: manga.chapters.iter().find(|c| c.id == record.chapter_id).map(|c| c.url.clone()),
            last_read: record.last_read(),
            page: record.page,
            percent: record.percent,
        })
        .collect();
    if let Some(latest) = history.iter().max_by_key(|record| record.last_read) {
        for chapter in chapters.iter_mut().filter(|c| Some(&c.url) == latest.chapter_url.as_ref()) {
            chapter.last_page_read = latest.page;
        }
    }

    let public_url = non_blank(manga.public_url.as_deref()).or_else(|| non_blank(Some(manga.url.as_str())));
    LibraryEntry {
        title: manga.title.clone(),
        url: manga.url.clone(),
        author: non_blank(manga.author.as_deref()),
        artist: non_blank(manga.artist.as_deref()),
        description: non_blank(manga.description.as_deref()),
        tags: manga.tags.iter().map(Tag::title).filter(|t| !t.is_empty()).map(str::to_string).collect(),
        status: Status::from_kotatsu(manga.state.as_deref()),
        thumbnail_url: non_blank(Some(manga.cover_url.as_str()))
            .or_else(|| non_blank(manga.large_cover_url.as_deref())),
        date_added,
        source: DeclaredSource {
            id: manga.source.clone(),
            name: manga.source.clone(),
            url: public_url,
        },
        categories,
        chapters,
        history,
    }
}

/// Write the library as a Kotatsu backup, resolving every entry's declared
/// (Tachiyomi) source to a Kotatsu parser key.
#[instrument(level = "debug", skip_all, fields(entries = library.entries.len()))]
pub fn write(library: &Library, resolver: &Resolver<'_>, now: i64) -> (Backup, Summary) {
    let registry = resolver.registry();
    let seed = resolver.seed();
    let mut summary = Summary::default();
    let mut keys = HashSet::new();

    let mut ids: HashMap<i64, i64> = HashMap::new();
    let categories = library
        .categories
        .iter()
        .zip(1..)
        .map(|(category, id)| {
            ids.insert(category.order, id);
            format::Category {
                category_id: id,
                created_at: now,
                sort_key: category.order,
                title: category.name.clone(),
                order: "NEWEST".to_string(),
                track: true,
                show_in_lib: true,
            }
        })
        .collect();

    let mut backup = Backup {
        categories,
        ..Backup::default()
    };
    for (entry, sort_key) in library.entries.iter().zip(0..) {
        let source = &entry.source;
        let resolution = resolver.resolve_to_target_key(&source.id, &source.name, source.url.as_deref());
        summary.record(resolution.tier);
        let key = resolution.identity.canonical_id;
        keys.insert(key.clone());

        let rewrite = registry.url_rewrite(&source.id);
        let url = (rewrite.manga_to_kotatsu)(&entry.url);
        let manga_id = hash_id(seed, &format!("{key}{url}"));
        let chapter_id = |chapter_url: &str| {
            let url = (rewrite.chapter_to_kotatsu)(chapter_url);
            hash_id(seed, &format!("{key}{url}"))
        };

        let domain = resolution
            .identity
            .domain
            .or_else(|| registry.kotatsu().by_id(&key).and_then(|e| e.domain.clone()));
        let public_url = match (entry.url.contains("://"), domain) {
            (true, _) => Some(entry.url.clone()),
            (false, Some(domain)) => Some(format!("https://{domain}/{}", entry.url.trim_start_matches('/'))),
            (false, None) => None,
        };

        let chapters = entry
            .chapters
            .iter()
            .map(|chapter| format::Chapter {
                id: chapter_id(&chapter.url),
                name: chapter.name.clone(),
                // Kotatsu writes 0 for an unknown number.
                number: if chapter.chapter_number == UNKNOWN_CHAPTER { 0.0 } else { chapter.chapter_number },
                volume: 0,
                url: (rewrite.chapter_to_kotatsu)(&chapter.url),
                scanlator: chapter.scanlator.clone(),
                uploaded_at: chapter.date_upload,
                branch: None,
                read: chapter.read,
            })
            .collect();

        let manga = Manga {
            id: manga_id,
            title: entry.title.clone(),
            alt_title: None,
            url,
            public_url,
            rating: -1.0,
            nsfw: false,
            cover_url: entry.thumbnail_url.clone().unwrap_or_default(),
            large_cover_url: None,
            state: entry.status.to_kotatsu().map(str::to_string),
            author: entry.author.clone(),
            artist: entry.artist.clone(),
            description: entry.description.clone(),
            source: key.clone(),
            tags: entry
                .tags
                .iter()
                .map(|tag| Tag::Full {
                    key: tag.to_lowercase(),
                    title: tag.clone(),
                    source: key.clone(),
                })
                .collect(),
            chapters,
        };

        let mut category_ids: Vec<i64> = entry.categories.iter().filter_map(|order| ids.get(order).copied()).collect();
        if category_ids.is_empty() {
            category_ids.push(0);
        }
        for category_id in category_ids {
            backup.favourites.push(Favourite {
                manga_id,
                category_id,
                sort_key,
                created_at: entry.date_added,
                manga: Some(manga.clone()),
            });
        }

        if let Some(history) = history(entry, manga_id, chapter_id, now) {
            backup.history.push(history);
        }
    }
    summary.sources = keys.len();
    (backup, summary)
}

/// One history row per manga: the latest record, or failing that the highest
/// chapter marked read.
fn history(entry: &LibraryEntry, manga_id: i64, chapter_id: impl Fn(&str) -> i64, now: i64) -> Option<History> {
    if let Some(record) = entry.last_read() {
        return Some(History {
            manga_id,
            created_at: entry.date_added.min(record.last_read),
            updated_at: record.last_read,
            chapter_id: record.chapter_url.as_deref().map(&chapter_id).unwrap_or_default(),
            page: record.page,
            scroll: 0,
            percent: record.percent,
        });
    }
    let chapter = entry
        .chapters
        .iter()
        .filter(|chapter| chapter.read)
        .max_by(|a, b| a.chapter_number.total_cmp(&b.chapter_number))?;
    let updated_at = if chapter.date_fetch > 0 { chapter.date_fetch } else { now };
    Some(History {
        manga_id,
        created_at: entry.date_added.min(updated_at),
        updated_at,
        chapter_id: chapter_id(&chapter.url),
        page: chapter.last_page_read,
        scroll: 0,
        percent: 0.0,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
