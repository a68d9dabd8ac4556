//! The format-neutral library both backups are read into.
//!
//! Entries carry the source as the *input* declared it. Resolution into the
//! target application's identity happens when the library is written out.

use shelf_backup::tachiyomi::status;
use shelf_identity::Tier;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Chapter number written when the input doesn't know it.
pub const UNKNOWN_CHAPTER: f32 = -1.0;

/// Publication status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    Unknown,
    Ongoing,
    Completed,
    Licensed,
    PublishingFinished,
    Cancelled,
    OnHiatus,
}
impl Status {
    /// Kotatsu's `state` field. `UPCOMING` has no counterpart and reads as
    /// unknown; `COMPLETED` is what some older exports wrote.
    pub fn from_kotatsu(state: Option<&str>) -> Self {
        match state.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("ONGOING") => Status::Ongoing,
            Some("FINISHED" | "COMPLETED") => Status::Completed,
            Some("ABANDONED") => Status::Cancelled,
            Some("PAUSED") => Status::OnHiatus,
            _ => Status::Unknown,
        }
    }

    pub fn to_kotatsu(self) -> Option<&'static str> {
        match self {
            Status::Ongoing => Some("ONGOING"),
            Status::Completed | Status::PublishingFinished => Some("FINISHED"),
            Status::Cancelled => Some("ABANDONED"),
            Status::OnHiatus => Some("PAUSED"),
            Status::Unknown | Status::Licensed => None,
        }
    }

    /// Out-of-range values read as unknown.
    pub fn from_tachiyomi(value: i32) -> Self {
        match value {
            status::ONGOING => Status::Ongoing,
            status::COMPLETED => Status::Completed,
            status::LICENSED => Status::Licensed,
            status::PUBLISHING_FINISHED => Status::PublishingFinished,
            status::CANCELLED => Status::Cancelled,
            status::ON_HIATUS => Status::OnHiatus,
            _ => Status::Unknown,
        }
    }

    pub fn to_tachiyomi(self) -> i32 {
        match self {
            Status::Unknown => status::UNKNOWN,
            Status::Ongoing => status::ONGOING,
            Status::Completed => status::COMPLETED,
            Status::Licensed => status::LICENSED,
            Status::PublishingFinished => status::PUBLISHING_FINISHED,
            Status::Cancelled => status::CANCELLED,
            Status::OnHiatus => status::ON_HIATUS,
        }
    }
}

/// A source as the input backup declared it, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredSource {
    /// Kotatsu parser key, or Tachiyomi source id as a string.
    pub id: String,
    pub name: String,
    /// Best absolute URL for the entry: public-facing if the input has one.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    /// Sorted by `order`, which is the entry's rank: `0..categories.len()`.
    pub categories: Vec<Category>,
    pub entries: Vec<LibraryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryEntry {
    pub title: String,
    /// URL as the input application stored it.
    pub url: String,
    pub author: Option<String>,
    pub artist: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub status: Status,
    pub thumbnail_url: Option<String>,
    pub date_added: i64,
    pub source: DeclaredSource,
    /// [`Category::order`] of each category the entry is in.
    pub categories: BTreeSet<i64>,
    pub chapters: Vec<ChapterEntry>,
    pub history: Vec<HistoryRecord>,
}
impl LibraryEntry {
    /// The most recently read history record.
    pub fn last_read(&self) -> Option<&HistoryRecord> {
        self.history.iter().max_by_key(|record| record.last_read)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterEntry {
    pub url: String,
    pub name: String,
    pub scanlator: Option<String>,
    /// [`UNKNOWN_CHAPTER`] when unknown.
    pub chapter_number: f32,
    pub read: bool,
    pub bookmark: bool,
    pub last_page_read: i64,
    pub date_fetch: i64,
    pub date_upload: i64,
    pub source_order: i64,
}

/// Normalize a chapter number: anything non-positive or non-finite is unknown.
pub fn chapter_number(value: f32) -> f32 {
    match value.is_finite() && value > 0.0 {
        true => value,
        false => UNKNOWN_CHAPTER,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    /// URL of the chapter read, when the input lets us name it.
    pub chapter_url: Option<String>,
    pub last_read: i64,
    pub page: i64,
    pub percent: f32,
}

/// Counts for the end-of-run log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub entries: usize,
    pub sources: usize,
    pub domain: usize,
    pub exact: usize,
    pub sanitized: usize,
    pub fuzzy: usize,
    pub fallback: usize,
}
impl Summary {
    pub fn record(&mut self, tier: Tier) {
        self.entries += 1;
        *self.tier_mut(tier) += 1;
    }

    /// Entries resolved by `tier`.
    pub fn count(&self, tier: Tier) -> usize {
        match tier {
            Tier::Domain => self.domain,
            Tier::Exact => self.exact,
            Tier::Sanitized => self.sanitized,
            Tier::Fuzzy => self.fuzzy,
            Tier::Fallback => self.fallback,
        }
    }

    fn tier_mut(&mut self, tier: Tier) -> &mut usize {
        match tier {
            Tier::Domain => &mut self.domain,
            Tier::Exact => &mut self.exact,
            Tier::Sanitized => &mut self.sanitized,
            Tier::Fuzzy => &mut self.fuzzy,
            Tier::Fallback => &mut self.fallback,
        }
    }
}
impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} entries from {} sources (", self.entries, self.sources)?;
        for (position, tier) in Tier::ALL.into_iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{tier} {}", self.count(tier))?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("ONGOING"), Status::Ongoing, Some("ONGOING"))]
    #[case(Some("finished"), Status::Completed, Some("FINISHED"))]
    #[case(Some("COMPLETED"), Status::Completed, Some("FINISHED"))]
    #[case(Some("ABANDONED"), Status::Cancelled, Some("ABANDONED"))]
    #[case(Some("PAUSED"), Status::OnHiatus, Some("PAUSED"))]
    #[case(Some("UPCOMING"), Status::Unknown, None)]
    #[case(None, Status::Unknown, None)]
    fn test_status_kotatsu(#[case] state: Option<&str>, #[case] expected: Status, #[case] back: Option<&str>) {
        let status = Status::from_kotatsu(state);
        assert_eq!(status, expected);
        assert_eq!(status.to_kotatsu(), back);
    }

    #[test]
    fn test_status_tachiyomi() {
        for value in 0..=6 {
            assert_eq!(Status::from_tachiyomi(value).to_tachiyomi(), value);
        }
        assert_eq!(Status::from_tachiyomi(42), Status::Unknown);
        assert_eq!(Status::PublishingFinished.to_kotatsu(), Some("FINISHED"));
        assert_eq!(Status::Licensed.to_kotatsu(), None);
    }

    #[rstest]
    #[case(12.5, 12.5)]
    #[case(0.0, UNKNOWN_CHAPTER)]
    #[case(-3.0, UNKNOWN_CHAPTER)]
    #[case(f32::NAN, UNKNOWN_CHAPTER)]
    #[case(f32::INFINITY, UNKNOWN_CHAPTER)]
    fn test_chapter_number(#[case] value: f32, #[case] expected: f32) {
        assert_eq!(chapter_number(value), expected);
    }

    #[test]
    fn test_summary() {
        let mut summary = Summary::default();
        for tier in [Tier::Domain, Tier::Domain, Tier::Fuzzy, Tier::Fallback] {
            summary.record(tier);
        }
        summary.sources = 2;
        assert_eq!(
            summary.to_string(),
            "4 entries from 2 sources (domain 2, exact 0, sanitized 0, fuzzy 1, fallback 1)"
        );
        assert_eq!(Tier::ALL.map(|tier| summary.count(tier)).iter().sum::<usize>(), summary.entries);
    }
}
