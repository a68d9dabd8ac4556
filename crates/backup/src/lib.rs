//! Backup formats of the two applications.
//!
//! - [`kotatsu`]: ZIP archive of JSON sections.
//! - [`tachiyomi`]: gzip-compressed protobuf.
//!
//! Both sides expose a `validate()` that is run before anything is written, so
//! a payload that would restore incorrectly never reaches the disk.

pub mod error;
pub mod kotatsu;
pub mod tachiyomi;

use time::UtcDateTime;

/// The current time in epoch milliseconds, which both formats use for dates.
pub fn now_millis() -> i64 {
    i64::try_from(UtcDateTime::now().unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis() {
        // 2020-01-01T00:00:00Z
        assert!(now_millis() > 1_577_836_800_000);
    }
}
