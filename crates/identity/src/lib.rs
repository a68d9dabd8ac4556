//! Source identity resolution between Kotatsu and Tachiyomi.
//!
//! Each application names the sites it scrapes differently: Tachiyomi uses a
//! signed 64-bit id per extension source, Kotatsu a constant-style parser key.
//! This crate holds both catalogs in a [`Registry`] and maps a source reference
//! from one application to the other with a [`Resolver`].

mod catalog;
mod domain;
pub mod error;
pub mod hash;
mod models;
mod registry;
pub mod resolve;
mod rewrite;
mod sanitize;
mod seed;

pub use crate::catalog::{Catalog, CatalogBuilder};
pub use crate::domain::{canonicalize, canonicalize_opt};
pub use crate::hash::{DEFAULT_SEED, hash_id, parse_source_id};
pub use crate::models::{CatalogEntry, Origin, SourceIdentity};
pub use crate::registry::{Registry, RegistryBuilder};
pub use crate::resolve::{DEFAULT_FUZZY_THRESHOLD, Resolution, Resolver, Tier};
pub use crate::rewrite::{DEFAULT_REWRITE, Rewrite, UrlRewrite};
pub use crate::sanitize::sanitize;
