//! Kotatsu ⇄ Tachiyomi backup transcoding.
//!
//! Both directions read the input backup into a format-neutral [`Library`],
//! then write that library out in the target format, resolving each entry's
//! source against the target catalog as it goes. Categories cross formats by
//! their rank, never by id.

pub mod error;
pub mod kotatsu;
mod models;
pub mod tachiyomi;

pub use crate::models::{
    Category, ChapterEntry, DeclaredSource, HistoryRecord, Library, LibraryEntry, Status, Summary, UNKNOWN_CHAPTER,
};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use shelf_backup::{kotatsu as kotatsu_format, now_millis, tachiyomi as tachiyomi_format};
use shelf_identity::Resolver;
use tracing::instrument;

/// A transcoded backup, already validated, and what it took to get there.
#[derive(Debug, Clone)]
pub struct Transcoded<T> {
    pub backup: T,
    pub summary: Summary,
}

#[derive(Debug, Clone, Copy)]
pub struct Transcoder<'r> {
    resolver: Resolver<'r>,
    now: i64,
}
impl<'r> Transcoder<'r> {
    pub fn new(resolver: Resolver<'r>) -> Self {
        Self {
            resolver,
            now: now_millis(),
        }
    }

    /// Fix the timestamp used for missing dates.
    pub fn with_now(mut self, now: i64) -> Self {
        self.now = now;
        self
    }

    /// Kotatsu → Tachiyomi.
    #[instrument(level = "info", skip_all, fields(favourites = backup.favourites.len()))]
    pub fn forward(&self, backup: &kotatsu_format::Backup) -> Result<Transcoded<tachiyomi_format::Backup>> {
        let library = kotatsu::read(backup, self.now);
        let (backup, summary) = tachiyomi::write(&library, &self.resolver);
        backup.validate().or_raise(|| ErrorKind::InvalidOutput("Tachiyomi"))?;
        tracing::info!(%summary, "Transcoded Kotatsu backup");
        Ok(Transcoded { backup, summary })
    }

    /// Tachiyomi → Kotatsu.
    #[instrument(level = "info", skip_all, fields(manga = backup.backup_manga.len()))]
    pub fn backward(&self, backup: &tachiyomi_format::Backup) -> Result<Transcoded<kotatsu_format::Backup>> {
        let library = tachiyomi::read(backup, self.now);
        let (backup, summary) = kotatsu::write(&library, &self.resolver, self.now);
        backup.validate().or_raise(|| ErrorKind::InvalidOutput("Kotatsu"))?;
        tracing::info!(%summary, "Transcoded Tachiyomi backup");
        Ok(Transcoded { backup, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_backup::kotatsu::{Chapter, Favourite, History, Manga};
    use shelf_identity::Registry;

    const NOW: i64 = 1_700_000_000_000;

    fn category(category_id: i64, sort_key: i64, title: &str) -> kotatsu_format::Category {
        kotatsu_format::Category {
            category_id,
            created_at: 0,
            sort_key,
            title: title.to_string(),
            order: "NEWEST".to_string(),
            track: true,
            show_in_lib: true,
        }
    }

    fn favourite(id: i64, category_id: i64) -> Favourite {
        Favourite {
            manga_id: id,
            category_id,
            sort_key: 0,
            created_at: 1_000,
            manga: Some(Manga {
                id,
                title: format!("Manga {id}"),
                url: format!("https://mangadex.org/title/uuid-{id}"),
                source: "MANGADEX".to_string(),
                state: Some("ONGOING".to_string()),
                chapters: vec![Chapter {
                    id: id * 100,
                    name: "Chapter 1".to_string(),
                    number: 1.0,
                    url: format!("chapter-{id}"),
                    read: true,
                    ..Chapter::default()
                }],
                ..Manga::default()
            }),
        }
    }

    fn kotatsu_backup() -> kotatsu_format::Backup {
        kotatsu_format::Backup {
            favourites: vec![favourite(1, 7), favourite(2, 8), favourite(3, 9), favourite(1, 9)],
            categories: vec![category(7, 0, "Reading"), category(8, 1, "Plan to read"), category(9, 2, "Done")],
            history: vec![],
        }
    }

    #[test]
    fn test_categories_survive_a_round_trip() {
        let registry = Registry::seeded();
        let transcoder = Transcoder::new(Resolver::new(&registry)).with_now(NOW);

        let forward = transcoder.forward(&kotatsu_backup()).unwrap();
        let names: Vec<(&str, i64)> = forward
            .backup
            .backup_categories
            .iter()
            .map(|c| (c.name.as_str(), c.order))
            .collect();
        assert_eq!(names, [("Reading", 0), ("Plan to read", 1), ("Done", 2)]);
        let memberships: Vec<Vec<i64>> = forward.backup.backup_manga.iter().map(|m| m.categories.clone()).collect();
        assert_eq!(memberships, [vec![0, 2], vec![1], vec![2]]);

        let backward = transcoder.backward(&forward.backup).unwrap();
        let by_id: std::collections::HashMap<i64, &str> = backward
            .backup
            .categories
            .iter()
            .map(|c| (c.category_id, c.title.as_str()))
            .collect();
        let rows: Vec<(String, &str)> = backward
            .backup
            .favourites
            .iter()
            .map(|f| (f.manga.as_ref().unwrap().title.clone(), by_id[&f.category_id]))
            .collect();
        assert_eq!(
            rows,
            [
                ("Manga 1".to_string(), "Reading"),
                ("Manga 1".to_string(), "Done"),
                ("Manga 2".to_string(), "Plan to read"),
                ("Manga 3".to_string(), "Done"),
            ]
        );
        assert_eq!(backward.summary.sources, 1);
    }

    #[test]
    fn test_only_the_latest_history_survives() {
        let registry = Registry::seeded();
        let transcoder = Transcoder::new(Resolver::new(&registry)).with_now(NOW);
        let mut backup = kotatsu_backup();
        backup.history = vec![
            History {
                manga_id: 2,
                updated_at: 100,
                ..History::default()
            },
            History {
                manga_id: 2,
                updated_at: 200,
                chapter_id: 200,
                ..History::default()
            },
        ];
        let forward = transcoder.forward(&backup).unwrap();
        let history = &forward.backup.backup_manga[1].history;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].last_read, 200);
        assert_eq!(history[0].url, "/chapter/chapter-2");
        assert!(forward.backup.backup_manga[0].history.is_empty());
    }

    #[test]
    fn test_untitled_entries_are_kept() {
        let registry = Registry::seeded();
        let transcoder = Transcoder::new(Resolver::new(&registry)).with_now(NOW);
        let mut backup = kotatsu_backup();
        if let Some(manga) = backup.favourites[1].manga.as_mut() {
            manga.title = String::new();
        }
        let forward = transcoder.forward(&backup).unwrap();
        assert_eq!(forward.backup.backup_manga.len(), 3);
        assert_eq!(forward.backup.backup_manga[1].title, "");
        assert_eq!(forward.summary.entries, 3);
    }

    #[test]
    fn test_chapter_ids_are_stable() {
        let registry = Registry::seeded();
        let transcoder = Transcoder::new(Resolver::new(&registry)).with_now(NOW);
        let tachiyomi = transcoder.forward(&kotatsu_backup()).unwrap().backup;

        let first = transcoder.backward(&tachiyomi).unwrap().backup;
        let second = transcoder.backward(&tachiyomi).unwrap().backup;
        let ids = |backup: &kotatsu_format::Backup| -> Vec<(i64, Vec<i64>)> {
            backup
                .favourites
                .iter()
                .filter_map(|f| f.manga.as_ref())
                .map(|m| (m.id, m.chapters.iter().map(|c| c.id).collect()))
                .collect()
        };
        assert_eq!(ids(&first), ids(&second));

        let seed = transcoder.resolver.seed();
        let manga = first.favourites[0].manga.as_ref().unwrap();
        assert_eq!(manga.url, "uuid-1");
        assert_eq!(manga.chapters[0].id, shelf_identity::hash_id(seed, "MANGADEXchapter-1"));
        assert_eq!(manga.chapters[0].number, 1.0);
        // Read state survives both hops.
        assert!(manga.chapters[0].read);
    }

    #[test]
    fn test_normalizes_rather_than_rejects() {
        let registry = Registry::seeded();
        let transcoder = Transcoder::new(Resolver::new(&registry)).with_now(NOW);
        let mut backup = kotatsu_backup();
        if let Some(manga) = backup.favourites[0].manga.as_mut() {
            manga.chapters[0].number = f32::NAN;
        }
        // Non-finite numbers are normalized, not rejected.
        assert!(transcoder.forward(&backup).is_ok());

        let mut tachiyomi = transcoder.forward(&kotatsu_backup()).unwrap().backup;
        tachiyomi.backup_sources.clear();
        let kotatsu = transcoder.backward(&tachiyomi).unwrap().backup;
        // Without a listed name the source is still found through its id.
        assert_eq!(kotatsu.favourites[0].manga.as_ref().unwrap().source, "MANGADEX");
    }
}
