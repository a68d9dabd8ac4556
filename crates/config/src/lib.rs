//! Layered configuration.
//!
//! Values are merged from, in increasing order of precedence:
//!
//! 1. Built-in defaults (see the `Default` impls below).
//! 2. `config.toml` / `config.yaml` in the user's configuration directory
//!    (`$XDG_CONFIG_HOME/shelf` on Linux).
//! 3. `shelf.toml` / `shelf.yaml` in the working directory.
//! 4. Environment variables prefixed with `SHELF_`, nested keys separated by
//!    a double underscore (`SHELF_CATALOG__ENABLED=false`).
//!
//! Every file is optional.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const ENV_PREFIX: &str = "SHELF_";
const APPLICATION: &str = "shelf";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub resolver: ResolverConfig,
    pub catalog: CatalogConfig,
}

/// Input files, checked in this order: the first one that exists decides the
/// direction of the conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub kotatsu: PathBuf,
    pub tachiyomi: PathBuf,
}
impl Default for InputConfig {
    fn default() -> Self {
        Self {
            kotatsu: PathBuf::from("Backup.zip"),
            tachiyomi: PathBuf::from("Backup.tachibk"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// File name of a converted Kotatsu backup.
    pub kotatsu: String,
    /// File name of a converted Tachiyomi backup.
    pub tachiyomi: String,
}
impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            kotatsu: "converted_kotatsu.zip".to_string(),
            tachiyomi: "converted_tachiyomi.tachibk".to_string(),
        }
    }
}
impl OutputConfig {
    pub fn kotatsu_path(&self) -> PathBuf {
        self.directory.join(&self.kotatsu)
    }

    pub fn tachiyomi_path(&self) -> PathBuf {
        self.directory.join(&self.tachiyomi)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum fuzzy similarity (exclusive, out of 200) for a name match to be
    /// accepted.
    pub fuzzy_threshold: f64,
    /// Seed of the 64-bit string hash used for synthetic identifiers.
    pub hash_seed: i64,
}
impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 70.0,
            hash_seed: 1_125_899_906_842_597,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Fetch live catalogs before converting. When disabled, only the built-in
    /// knowledge base is used.
    pub enabled: bool,
    /// Keiyoushi extension indexes, tried in order until one parses.
    pub keiyoushi_urls: Vec<Url>,
    /// GitHub tree listing of the Doki parser repository.
    pub doki_tree_url: Url,
    /// Base URL that tree paths are resolved against to download raw files.
    pub doki_raw_base: Url,
    /// Extension languages to keep from the Keiyoushi index; empty keeps all.
    pub languages: Vec<String>,
    /// Concurrent downloads per batch.
    pub batch_size: usize,
    pub timeout_secs: u64,
    /// Name of the environment variable holding a GitHub token.
    pub token_env: String,
}
impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keiyoushi_urls: vec![
                default_url("https://raw.githubusercontent.com/keiyoushi/extensions/repo/index.min.json"),
                default_url("https://raw.githubusercontent.com/keiyoushi/extensions/repo/index.json"),
            ],
            doki_tree_url: default_url("https://api.github.com/repos/DokiTeam/doki-exts/git/trees/base?recursive=1"),
            doki_raw_base: default_url("https://raw.githubusercontent.com/DokiTeam/doki-exts/base/"),
            languages: Vec::new(),
            batch_size: 10,
            timeout_secs: 20,
            token_env: "GH_TOKEN".to_string(),
        }
    }
}
impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The GitHub token, if the configured variable is set and non-empty.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env).ok().filter(|token| !token.trim().is_empty())
    }
}

/// Parses one of the hardcoded URLs above.
fn default_url(url: &'static str) -> Url {
    match Url::parse(url) {
        Ok(url) => url,
        Err(e) => panic!("built-in URL {url} is invalid: {e}"),
    }
}

impl Config {
    /// Load from every layer, then validate.
    pub fn load() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", APPLICATION);
        Self::from_figment(Self::figment(dirs.as_ref().map(ProjectDirs::config_dir), Path::new(".")))
    }

    /// Build the layered provider without extracting it.
    pub fn figment(config_dir: Option<&Path>, working_dir: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(dir) = config_dir {
            tracing::debug!(directory = %dir.display(), "Looking for user configuration");
            figment = figment.merge(Toml::file(dir.join("config.toml"))).merge(Yaml::file(dir.join("config.yaml")));
        }
        figment
            .merge(Toml::file(working_dir.join(format!("{APPLICATION}.toml"))))
            .merge(Yaml::file(working_dir.join(format!("{APPLICATION}.yaml"))))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.resolver.fuzzy_threshold;
        if !(0.0..=200.0).contains(&threshold) {
            exn::bail!(ErrorKind::Invalid {
                key: "resolver.fuzzy_threshold",
                reason: format!("must be between 0 and 200, got {threshold}"),
            });
        }
        if self.catalog.batch_size == 0 {
            exn::bail!(ErrorKind::Invalid {
                key: "catalog.batch_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.catalog.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid {
                key: "catalog.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        for (key, name) in [("output.kotatsu", &self.output.kotatsu), ("output.tachiyomi", &self.output.tachiyomi)] {
            if name.trim().is_empty() {
                exn::bail!(ErrorKind::Invalid {
                    key,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}
