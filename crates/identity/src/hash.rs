//! Deterministic 64-bit identifiers.
//!
//! Kotatsu derives manga and chapter ids (and we derive ids for sources nobody
//! has heard of) with a seeded variant of Java's `String.hashCode`, widened to
//! 64 bits. Arithmetic must wrap exactly like a JVM `long` so that the ids we
//! synthesize are the ids Kotatsu would have synthesized.

use crate::error::{ErrorKind, Result};

/// Seed used by Kotatsu's `longHashCode()`.
pub const DEFAULT_SEED: i64 = 1_125_899_906_842_597;

/// Reduce an arbitrary-width integer into the signed 64-bit range.
///
/// Masks to the low 64 bits and reinterprets the top bit as the sign, which is
/// what a JVM `long` does on overflow.
///
/// # Examples
///
/// ```
/// use shelf_identity::hash::wrap64;
/// assert_eq!(wrap64(1), 1);
/// assert_eq!(wrap64(u64::MAX as i128), -1);
/// assert_eq!(wrap64(i64::MAX as i128 + 1), i64::MIN);
/// ```
#[inline]
#[must_use]
pub fn wrap64(value: i128) -> i64 {
    (value as u128 & u64::MAX as u128) as u64 as i64
}

/// Seeded polynomial string hash: `acc = wrap64(31 * acc + unit)`.
///
/// Iterates UTF-16 code units, matching `CharSequence.get()` on the JVM. For
/// text inside the Basic Multilingual Plane this is identical to iterating code
/// points.
///
/// # Examples
///
/// ```
/// use shelf_identity::hash::hash_id;
/// // With a zero seed this is Java's `String.hashCode`, just 64 bits wide.
/// assert_eq!(hash_id(0, "a"), 97);
/// assert_eq!(hash_id(0, "ab"), 97 * 31 + 98);
/// ```
#[must_use]
pub fn hash_id(seed: i64, s: &str) -> i64 {
    s.encode_utf16().fold(seed, |acc, unit| acc.wrapping_mul(31).wrapping_add(i64::from(unit)))
}

/// Parse a source id that might have been printed as unsigned.
///
/// Some catalog indexes print ids as unsigned 64-bit numbers; those are
/// reinterpreted through [`wrap64`] so that both spellings of the same id
/// compare equal.
pub fn parse_source_id(value: &str) -> Result<i64> {
    let trimmed = value.trim();
    if let Ok(id) = trimmed.parse::<i64>() {
        return Ok(id);
    }
    match trimmed.parse::<u64>() {
        Ok(id) => Ok(wrap64(i128::from(id))),
        Err(_) => exn::bail!(ErrorKind::InvalidSourceId(value.to_string())),
    }
}
