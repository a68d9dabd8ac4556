//! Tachiyomi backups: a protobuf `Backup` message, usually gzip-compressed.

mod models;

pub use self::models::{Backup, BackupCategory, BackupChapter, BackupHistory, BackupManga, BackupSource, status};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use prost::Message;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;
use tracing::instrument;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
pub const BACKUP_MANGA: &str = "backupManga";

impl Backup {
    /// Decode a backup, decompressing it first if it starts with the gzip
    /// magic bytes.
    ///
    /// Protobuf can't tell an absent list from an empty one, so a backup with
    /// neither manga nor categories is treated as missing its manga list.
    #[instrument(level = "debug", skip(bytes), fields(size = bytes.len(), gzip))]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            exn::bail!(ErrorKind::MissingSection(BACKUP_MANGA));
        }
        let gzip = bytes.starts_with(&GZIP_MAGIC);
        tracing::Span::current().record("gzip", gzip);
        let backup = match gzip {
            true => {
                let mut payload = Vec::new();
                GzDecoder::new(bytes).read_to_end(&mut payload).or_raise(|| ErrorKind::MalformedArchive)?;
                Self::decode(payload.as_slice())
            },
            false => Self::decode(bytes),
        }
        .or_raise(|| ErrorKind::MalformedArchive)?;
        if backup.backup_manga.is_empty() && backup.backup_categories.is_empty() {
            exn::bail!(ErrorKind::MissingSection(BACKUP_MANGA));
        }
        tracing::debug!(
            manga = backup.backup_manga.len(),
            categories = backup.backup_categories.len(),
            sources = backup.backup_sources.len(),
            "Parsed Tachiyomi backup"
        );
        Ok(backup)
    }

    pub fn read_path(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).or_raise(|| ErrorKind::Io)?;
        Self::from_bytes(&bytes)
    }

    /// Encode and gzip-compress, the way the app writes `.tachibk` files.
    pub fn to_gzip_bytes(&self) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.encode_to_vec()).or_raise(|| ErrorKind::Io)?;
        encoder.finish().or_raise(|| ErrorKind::Io)
    }

    /// Check references inside the message before writing.
    pub fn validate(&self) -> Result<()> {
        let mut sources = HashSet::new();
        for source in &self.backup_sources {
            if !sources.insert(source.source_id) {
                exn::bail!(ErrorKind::Schema(format!("source {} is listed twice", source.source_id)));
            }
        }
        let mut orders = HashSet::new();
        for category in &self.backup_categories {
            if !orders.insert(category.order) {
                exn::bail!(ErrorKind::Schema(format!("category order {} is used twice", category.order)));
            }
        }
        for (position, manga) in self.backup_manga.iter().enumerate() {
            if !sources.contains(&manga.source) {
                exn::bail!(ErrorKind::Schema(format!("manga {position} uses unlisted source {}", manga.source)));
            }
            if let Some(order) = manga.categories.iter().find(|order| !orders.contains(*order)) {
                exn::bail!(ErrorKind::Schema(format!("manga {position} is in unknown category {order}")));
            }
            if !(status::UNKNOWN..=status::ON_HIATUS).contains(&manga.status) {
                exn::bail!(ErrorKind::Schema(format!("manga {position} has status {}", manga.status)));
            }
            if let Some(chapter) = manga.chapters.iter().find(|c| !c.chapter_number.is_finite()) {
                exn::bail!(ErrorKind::Schema(format!(
                    "manga {position} chapter {:?} has a non-finite number",
                    chapter.name
                )));
            }
        }
        Ok(())
    }
}
