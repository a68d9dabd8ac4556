//! Kotatsu backups: a ZIP archive of JSON sections.
//!
//! Sections are stored as extensionless entries (`favourites`, `history`, ...),
//! although older exports add a `.json` suffix; both are accepted on read. Only
//! `favourites` is mandatory.

mod models;

pub use self::models::{Category, Chapter, Favourite, History, Index, Manga, Tag};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tracing::instrument;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const INDEX: &str = "index";
pub const FAVOURITES: &str = "favourites";
pub const CATEGORIES: &str = "categories";
pub const HISTORY: &str = "history";

/// Sections Kotatsu expects to find even when we have nothing to put in them.
const EMPTY_SECTIONS: &[(&str, &str)] = &[
    ("bookmarks", "[]"),
    ("sources", "[]"),
    ("saved_filters", "[]"),
    ("settings", "{}"),
    ("reader_grid", "{}"),
    ("scrobbling", "{}"),
    ("statistics", "{}"),
];

const BACKUP_VERSION: u32 = 2;
const APP_VERSION: &str = "2025.01.01";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Backup {
    pub favourites: Vec<Favourite>,
    pub categories: Vec<Category>,
    pub history: Vec<History>,
}

impl Backup {
    /// Read a backup from a ZIP archive.
    #[instrument(level = "debug", skip(reader))]
    pub fn read(reader: impl Read + Seek) -> Result<Self> {
        let mut archive = ZipArchive::new(reader).or_raise(|| ErrorKind::MalformedArchive)?;
        let mut sections: HashMap<String, Vec<u8>> = HashMap::new();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).or_raise(|| ErrorKind::MalformedArchive)?;
            if entry.is_dir() {
                continue;
            }
            let Some(name) = section_name(entry.name()) else {
                continue;
            };
            let mut data = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
            entry.read_to_end(&mut data).or_raise(|| ErrorKind::MalformedArchive)?;
            tracing::trace!(section = name, size = data.len(), "Read section");
            sections.insert(name, data);
        }

        let favourites = match sections.get(FAVOURITES) {
            Some(data) => parse(FAVOURITES, data)?,
            None => exn::bail!(ErrorKind::MissingSection(FAVOURITES)),
        };
        let backup = Self {
            favourites,
            categories: optional(&sections, CATEGORIES)?,
            history: optional(&sections, HISTORY)?,
        };
        tracing::debug!(
            favourites = backup.favourites.len(),
            categories = backup.categories.len(),
            history = backup.history.len(),
            "Parsed Kotatsu backup"
        );
        Ok(backup)
    }

    pub fn read_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref()).or_raise(|| ErrorKind::Io)?;
        Self::read(std::io::BufReader::new(file))
    }

    /// Write the backup as a ZIP archive, including Kotatsu's empty sections.
    #[instrument(level = "debug", skip_all, fields(favourites = self.favourites.len()))]
    pub fn write(&self, writer: impl Write + Seek, created_at: i64) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let index = Index {
            version: BACKUP_VERSION,
            created_at,
            app_version: APP_VERSION.to_string(),
        };
        let sections = [
            (INDEX, to_json(&index)?),
            (FAVOURITES, to_json(&self.favourites)?),
            (CATEGORIES, to_json(&self.categories)?),
            (HISTORY, to_json(&self.history)?),
        ];
        let empty = EMPTY_SECTIONS.iter().map(|(name, body)| (*name, body.as_bytes().to_vec()));
        for (name, body) in sections.into_iter().chain(empty) {
            zip.start_file(name, options).or_raise(|| ErrorKind::Io)?;
            zip.write_all(&body).or_raise(|| ErrorKind::Io)?;
        }
        zip.finish().or_raise(|| ErrorKind::Io)?;
        Ok(())
    }

    /// Serialize to an in-memory ZIP archive.
    pub fn to_bytes(&self, created_at: i64) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.write(&mut buffer, created_at)?;
        Ok(buffer.into_inner())
    }

    /// Check references between sections before writing.
    pub fn validate(&self) -> Result<()> {
        let categories: HashSet<i64> = self.categories.iter().map(|c| c.category_id).collect();
        if categories.len() != self.categories.len() {
            exn::bail!(ErrorKind::Schema("duplicate category id".to_string()));
        }
        let mut manga_ids = HashSet::new();
        for (position, favourite) in self.favourites.iter().enumerate() {
            let Some(manga) = &favourite.manga else {
                exn::bail!(ErrorKind::Schema(format!("favourite {position} has no manga")));
            };
            if manga.id != favourite.manga_id {
                exn::bail!(ErrorKind::Schema(format!("favourite {position} references manga {}", favourite.manga_id)));
            }
            if manga.source.trim().is_empty() {
                exn::bail!(ErrorKind::Schema(format!("manga {} has no source", manga.id)));
            }
            if favourite.category_id != 0 && !categories.contains(&favourite.category_id) {
                exn::bail!(ErrorKind::Schema(format!(
                    "manga {} is in unknown category {}",
                    manga.id, favourite.category_id
                )));
            }
            manga_ids.insert(manga.id);
        }
        if let Some(history) = self.history.iter().find(|h| !manga_ids.contains(&h.manga_id)) {
            exn::bail!(ErrorKind::Schema(format!("history references unknown manga {}", history.manga_id)));
        }
        Ok(())
    }
}

/// `favourites`, `favourites.json` and `backup/favourites.json` all name the
/// `favourites` section.
fn section_name(entry: &str) -> Option<String> {
    let file = entry.rsplit(['/', '\\']).next()?;
    let name = file.strip_suffix(".json").unwrap_or(file);
    (!name.is_empty()).then(|| name.to_string())
}

fn parse<T: DeserializeOwned>(section: &'static str, data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).or_raise(|| ErrorKind::MalformedSection(section))
}

fn optional<T: DeserializeOwned + Default>(sections: &HashMap<String, Vec<u8>>, section: &'static str) -> Result<T> {
    match sections.get(section) {
        Some(data) => parse(section, data),
        None => {
            tracing::debug!(section, "Optional section absent");
            Ok(T::default())
        },
    }
}

fn to_json(value: &impl Serialize) -> Result<Vec<u8>> {
    serde_json::to_vec(value).or_raise(|| ErrorKind::Schema("unserializable section".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn manga(id: i64, source: &str) -> Manga {
        Manga {
            id,
            title: format!("Manga {id}"),
            url: format!("/m/{id}"),
            source: source.to_string(),
            ..Manga::default()
        }
    }

    fn sample() -> Backup {
        Backup {
            favourites: vec![Favourite {
                manga_id: 1,
                category_id: 7,
                manga: Some(manga(1, "MANGADEX")),
                ..Favourite::default()
            }],
            categories: vec![Category {
                category_id: 7,
                created_at: 0,
                sort_key: 0,
                title: "Reading".to_string(),
                order: "NEWEST".to_string(),
                track: true,
                show_in_lib: true,
            }],
            history: vec![History {
                manga_id: 1,
                updated_at: 200,
                ..History::default()
            }],
        }
    }

    #[rstest]
    #[case("favourites", Some("favourites"))]
    #[case("favourites.json", Some("favourites"))]
    #[case("backup/history.json", Some("history"))]
    #[case(".json", None)]
    #[case("dir/", None)]
    fn test_section_name(#[case] entry: &str, #[case] expected: Option<&str>) {
        assert_eq!(section_name(entry).as_deref(), expected);
    }

    #[rstest]
    #[case::extensionless("favourites", "history")]
    #[case::json_suffix("favourites.json", "history.json")]
    fn test_read(#[case] favourites: &str, #[case] history: &str) {
        let bytes = archive(&[
            (favourites, r#"[{"manga_id": 1, "manga": {"id": 1, "source": "MANGADEX"}}]"#),
            (history, r#"[{"manga_id": 1, "updated_at": 5}]"#),
            ("index", r#"{"version": 2}"#),
        ]);
        let backup = Backup::read(Cursor::new(bytes)).unwrap();
        assert_eq!(backup.favourites.len(), 1);
        assert_eq!(backup.history[0].updated_at, 5);
        assert!(backup.categories.is_empty());
    }

    #[test]
    fn test_read_missing_favourites() {
        let bytes = archive(&[("history", "[]")]);
        let err = Backup::read(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingSection("favourites")));
    }

    #[test]
    fn test_read_malformed_section() {
        let bytes = archive(&[("favourites", "{not json")]);
        let err = Backup::read(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedSection("favourites")));
    }

    #[test]
    fn test_read_not_a_zip() {
        let err = Backup::read(Cursor::new(b"definitely not a zip".to_vec())).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedArchive));
    }

    #[test]
    fn test_write_layout() {
        let bytes = sample().to_bytes(1_700_000_000_000).unwrap();
        let mut zip = ZipArchive::new(Cursor::new(bytes.clone())).unwrap();
        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            [
                "bookmarks",
                "categories",
                "favourites",
                "history",
                "index",
                "reader_grid",
                "saved_filters",
                "scrobbling",
                "settings",
                "sources",
                "statistics"
            ]
        );
        let mut index = String::new();
        zip.by_name("index").unwrap().read_to_string(&mut index).unwrap();
        let index: Index = serde_json::from_str(&index).unwrap();
        assert_eq!(index.version, 2);
        assert_eq!(index.created_at, 1_700_000_000_000);

        assert_eq!(Backup::read(Cursor::new(bytes)).unwrap(), sample());
    }

    #[test]
    fn test_read_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Backup.zip");
        std::fs::write(&path, sample().to_bytes(0).unwrap()).unwrap();
        assert_eq!(Backup::read_path(&path).unwrap(), sample());
        assert!(Backup::read_path(dir.path().join("missing.zip")).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());

        let mut unknown_category = sample();
        unknown_category.favourites[0].category_id = 99;
        assert!(matches!(&*unknown_category.validate().unwrap_err(), ErrorKind::Schema(_)));

        let mut orphan_history = sample();
        orphan_history.history[0].manga_id = 2;
        assert!(orphan_history.validate().is_err());

        let mut no_source = sample();
        no_source.favourites[0].manga.as_mut().unwrap().source = String::new();
        assert!(no_source.validate().is_err());

        let mut uncategorized = sample();
        uncategorized.favourites[0].category_id = 0;
        assert!(uncategorized.validate().is_ok());
    }
}
