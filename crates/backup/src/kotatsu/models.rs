//! Kotatsu backup sections.
//!
//! Kotatsu's own exporter has changed field names over the years (`id` vs
//! `category_id`, `name` vs `title`), so deserialization accepts the known
//! aliases and defaults everything optional. Serialization always uses the
//! current names.

use serde::{Deserialize, Deserializer, Serialize};

/// Contents of the `index` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub version: u32,
    pub created_at: i64,
    pub app_version: String,
}

/// One row of the `favourites` section: a manga in a category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Favourite {
    #[serde(default)]
    pub manga_id: i64,
    #[serde(default)]
    pub category_id: i64,
    #[serde(default)]
    pub sort_key: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub manga: Option<Manga>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manga {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_title: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default = "unknown_rating")]
    pub rating: f32,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub cover_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_cover_url: Option<String>,
    /// `ONGOING`, `FINISHED`, `ABANDONED`, `PAUSED`, `UPCOMING`, or absent.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Kotatsu parser key, such as `MANGADEX`.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chapters: Vec<Chapter>,
}

fn unknown_rating() -> f32 {
    -1.0
}

/// A genre tag. Older exports store plain strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    Plain(String),
    Full {
        #[serde(default)]
        key: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        source: String,
    },
}
impl Tag {
    /// Human-readable name of the tag.
    pub fn title(&self) -> &str {
        match self {
            Tag::Plain(title) => title,
            Tag::Full { title, key, .. } if title.is_empty() => key,
            Tag::Full { title, .. } => title,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(default)]
    pub id: i64,
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub number: f32,
    #[serde(default)]
    pub volume: i32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub scanlator: Option<String>,
    #[serde(default)]
    pub uploaded_at: i64,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(alias = "id")]
    pub category_id: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default, alias = "sortKey")]
    pub sort_key: i64,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default = "default_order")]
    pub order: String,
    #[serde(default = "yes")]
    pub track: bool,
    #[serde(default = "yes")]
    pub show_in_lib: bool,
}

fn default_order() -> String {
    "NEWEST".to_string()
}

fn yes() -> bool {
    true
}

/// One row of the `history` section: the reading position in a manga.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub manga_id: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub chapter_id: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub page: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub scroll: i64,
    #[serde(default, deserialize_with = "lenient_f32")]
    pub percent: f32,
}

impl History {
    /// When this entry was last touched.
    pub fn last_read(&self) -> i64 {
        self.updated_at.max(self.created_at)
    }
}

/// Numbers written by different exporters as ints, floats or strings.
fn lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_f32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or_default() as f32)
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(lenient(deserializer)?.unwrap_or_default() as i64)
}
