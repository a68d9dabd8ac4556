//! Tachiyomi/Mihon backup messages.
//!
//! Only the fields that carry library state are modelled; prost skips unknown
//! fields on decode, so reader preferences, tracking and extension repositories
//! in a real backup are ignored rather than rejected.

/// Values of [`BackupManga::status`].
pub mod status {
    pub const UNKNOWN: i32 = 0;
    pub const ONGOING: i32 = 1;
    pub const COMPLETED: i32 = 2;
    pub const LICENSED: i32 = 3;
    pub const PUBLISHING_FINISHED: i32 = 4;
    pub const CANCELLED: i32 = 5;
    pub const ON_HIATUS: i32 = 6;
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Backup {
    #[prost(message, repeated, tag = "1")]
    pub backup_manga: Vec<BackupManga>,
    #[prost(message, repeated, tag = "2")]
    pub backup_categories: Vec<BackupCategory>,
    #[prost(message, repeated, tag = "101")]
    pub backup_sources: Vec<BackupSource>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BackupManga {
    #[prost(int64, tag = "1")]
    pub source: i64,
    #[prost(string, tag = "2")]
    pub url: String,
    #[prost(string, tag = "3")]
    pub title: String,
    #[prost(string, optional, tag = "4")]
    pub artist: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub author: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub description: Option<String>,
    #[prost(string, repeated, tag = "7")]
    pub genre: Vec<String>,
    #[prost(int32, tag = "8")]
    pub status: i32,
    #[prost(string, optional, tag = "9")]
    pub thumbnail_url: Option<String>,
    #[prost(int64, tag = "13")]
    pub date_added: i64,
    #[prost(message, repeated, tag = "16")]
    pub chapters: Vec<BackupChapter>,
    /// [`BackupCategory::order`] of every category the manga is in.
    #[prost(int64, repeated, packed = "false", tag = "17")]
    pub categories: Vec<i64>,
    #[prost(bool, tag = "100")]
    pub favorite: bool,
    #[prost(message, repeated, tag = "104")]
    pub history: Vec<BackupHistory>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BackupChapter {
    #[prost(string, tag = "1")]
    pub url: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, optional, tag = "3")]
    pub scanlator: Option<String>,
    #[prost(bool, tag = "4")]
    pub read: bool,
    #[prost(bool, tag = "5")]
    pub bookmark: bool,
    #[prost(int64, tag = "6")]
    pub last_page_read: i64,
    #[prost(int64, tag = "7")]
    pub date_fetch: i64,
    #[prost(int64, tag = "8")]
    pub date_upload: i64,
    /// `-1` when unknown.
    #[prost(float, tag = "9")]
    pub chapter_number: f32,
    #[prost(int64, tag = "10")]
    pub source_order: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BackupHistory {
    /// URL of the chapter last read.
    #[prost(string, tag = "1")]
    pub url: String,
    #[prost(int64, tag = "2")]
    pub last_read: i64,
    #[prost(int64, tag = "3")]
    pub read_duration: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BackupCategory {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(int64, tag = "2")]
    pub order: i64,
    #[prost(int64, tag = "100")]
    pub flags: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BackupSource {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(int64, tag = "2")]
    pub source_id: i64,
}
