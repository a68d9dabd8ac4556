//! A single conversion: find the input, build the registry, transcode, write.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use shelf_backup::{kotatsu, now_millis, tachiyomi};
use shelf_catalog::{Fetch, HttpFetcher};
use shelf_config::{CatalogConfig, Config, InputConfig, OutputConfig};
use shelf_identity::{Registry, RegistryBuilder, Resolver};
use shelf_transcode::Transcoder;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::instrument;

/// The backup to convert. Its format decides the direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Kotatsu(PathBuf),
    Tachiyomi(PathBuf),
}
impl Input {
    /// A Kotatsu backup wins if both are present.
    pub fn detect(config: &InputConfig) -> Result<Self> {
        if config.kotatsu.is_file() {
            return Ok(Input::Kotatsu(config.kotatsu.clone()));
        }
        if config.tachiyomi.is_file() {
            return Ok(Input::Tachiyomi(config.tachiyomi.clone()));
        }
        exn::bail!(ErrorKind::NoInput {
            kotatsu: config.kotatsu.display().to_string(),
            tachiyomi: config.tachiyomi.display().to_string(),
        })
    }
}

/// Run a conversion end to end and return the path written.
pub async fn run(config: &Config) -> Result<PathBuf> {
    let input = Input::detect(&config.input)?;
    tracing::info!(?input, "Found backup");
    let registry = match HttpFetcher::from_config(&config.catalog) {
        Ok(fetcher) => registry(&fetcher, &config.catalog).await,
        Err(e) => {
            tracing::warn!(error = ?e, "Could not create HTTP client; using built-in catalogs only");
            Registry::seeded()
        },
    };
    let resolver = Resolver::new(&registry)
        .with_threshold(config.resolver.fuzzy_threshold)
        .with_seed(config.resolver.hash_seed);
    convert(&input, &config.output, Transcoder::new(resolver))
}

/// The built-in catalogs, plus whatever the live catalogs add.
pub async fn registry(fetcher: &dyn Fetch, config: &CatalogConfig) -> Registry {
    let mut builder = RegistryBuilder::seeded();
    shelf_catalog::sync(fetcher, config).await.merge_into(&mut builder);
    builder.build()
}

#[instrument(level = "debug", skip(output, transcoder))]
pub fn convert(input: &Input, output: &OutputConfig, transcoder: Transcoder<'_>) -> Result<PathBuf> {
    let (path, bytes) = match input {
        Input::Kotatsu(path) => {
            let backup = kotatsu::Backup::read_path(path).or_raise(|| ErrorKind::Read(path.display().to_string()))?;
            let transcoded = transcoder.forward(&backup).or_raise(|| ErrorKind::Transcode)?;
            let target = output.tachiyomi_path();
            let bytes = transcoded
                .backup
                .to_gzip_bytes()
                .or_raise(|| ErrorKind::Write(target.display().to_string()))?;
            (target, bytes)
        },
        Input::Tachiyomi(path) => {
            let backup =
                tachiyomi::Backup::read_path(path).or_raise(|| ErrorKind::Read(path.display().to_string()))?;
            let transcoded = transcoder.backward(&backup).or_raise(|| ErrorKind::Transcode)?;
            let target = output.kotatsu_path();
            let bytes = transcoded
                .backup
                .to_bytes(now_millis())
                .or_raise(|| ErrorKind::Write(target.display().to_string()))?;
            (target, bytes)
        },
    };
    write_atomic(&path, &bytes)?;
    Ok(path)
}

/// Write through a temporary file in the target directory, so the target is
/// either untouched or complete.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let error = || ErrorKind::Write(path.display().to_string());
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory).or_raise(error)?;
    let mut file = NamedTempFile::new_in(directory).or_raise(error)?;
    file.write_all(bytes).or_raise(error)?;
    file.as_file().sync_all().or_raise(error)?;
    file.persist(path).or_raise(error)?;
    tracing::debug!(path = %path.display(), size = bytes.len(), "Wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_backup::kotatsu::{Favourite, Manga};
    use shelf_catalog::MockFetcher;
    use std::io::Cursor;

    fn input_config(dir: &Path) -> InputConfig {
        InputConfig {
            kotatsu: dir.join("Backup.zip"),
            tachiyomi: dir.join("Backup.tachibk"),
        }
    }

    fn output_config(dir: &Path) -> OutputConfig {
        OutputConfig {
            directory: dir.join("output"),
            ..OutputConfig::default()
        }
    }

    fn kotatsu_backup() -> kotatsu::Backup {
        kotatsu::Backup {
            favourites: vec![Favourite {
                manga_id: 1,
                manga: Some(Manga {
                    id: 1,
                    title: "Solo Leveling".to_string(),
                    url: "/series/solo".to_string(),
                    public_url: Some("https://asuracomic.net/series/solo".to_string()),
                    source: "ASURA_SCANS".to_string(),
                    ..Manga::default()
                }),
                ..Favourite::default()
            }],
            ..kotatsu::Backup::default()
        }
    }

    #[test]
    fn test_detect() {
        let dir = tempfile::tempdir().unwrap();
        let config = input_config(dir.path());
        let err = Input::detect(&config).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NoInput { .. }));

        std::fs::write(&config.tachiyomi, b"").unwrap();
        assert_eq!(Input::detect(&config).unwrap(), Input::Tachiyomi(config.tachiyomi.clone()));

        std::fs::write(&config.kotatsu, b"").unwrap();
        assert_eq!(Input::detect(&config).unwrap(), Input::Kotatsu(config.kotatsu.clone()));
    }

    #[test]
    fn test_convert_both_ways() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = input_config(dir.path());
        let output = output_config(dir.path());
        let registry = Registry::seeded();
        let transcoder = Transcoder::new(Resolver::new(&registry));

        std::fs::write(&inputs.kotatsu, kotatsu_backup().to_bytes(0).unwrap()).unwrap();
        let written = convert(&Input::Kotatsu(inputs.kotatsu.clone()), &output, transcoder).unwrap();
        assert_eq!(written, output.tachiyomi_path());
        let converted = tachiyomi::Backup::read_path(&written).unwrap();
        assert_eq!(converted.backup_manga[0].title, "Solo Leveling");
        assert_eq!(converted.backup_sources[0].name, "Asura Scans");

        std::fs::copy(&written, &inputs.tachiyomi).unwrap();
        let written = convert(&Input::Tachiyomi(inputs.tachiyomi.clone()), &output, transcoder).unwrap();
        assert_eq!(written, output.kotatsu_path());
        let bytes = std::fs::read(&written).unwrap();
        let back = kotatsu::Backup::read(Cursor::new(bytes)).unwrap();
        let manga = back.favourites[0].manga.as_ref().unwrap();
        assert_eq!(manga.source, "ASURA_SCANS");
        assert_eq!(manga.public_url.as_deref(), Some("https://asuracomic.net/series/solo"));

        // Only the two outputs: no temporary files left behind.
        assert_eq!(std::fs::read_dir(&output.directory).unwrap().count(), 2);
    }

    #[test]
    fn test_convert_malformed_input() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = input_config(dir.path());
        let output = output_config(dir.path());
        std::fs::write(&inputs.kotatsu, b"not a zip").unwrap();
        let registry = Registry::seeded();
        let err = convert(&Input::Kotatsu(inputs.kotatsu), &output, Transcoder::new(Resolver::new(&registry)))
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Read(_)));
        assert!(!output.directory.exists());
    }

    #[test]
    fn test_convert_tachiyomi_without_manga() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = input_config(dir.path());
        let output = output_config(dir.path());
        let registry = Registry::seeded();
        let transcoder = Transcoder::new(Resolver::new(&registry));
        for bytes in [&[][..], &[0x90, 0x03, 0x01][..]] {
            std::fs::write(&inputs.tachiyomi, bytes).unwrap();
            let err = convert(&Input::Tachiyomi(inputs.tachiyomi.clone()), &output, transcoder).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Read(_)));
            assert!(!output.kotatsu_path().exists());
        }
    }

    #[tokio::test]
    async fn test_registry_degrades_to_built_in() {
        let fetcher = MockFetcher::default();
        let registry = registry(&fetcher, &CatalogConfig::default()).await;
        assert!(!fetcher.requests().await.is_empty());
        assert!(registry.tachiyomi().by_domain("mangadex.org").is_some());
    }

    #[tokio::test]
    async fn test_registry_learns_live_sources() {
        let config = CatalogConfig::default();
        let index = r#"[{"name": "Tachiyomi: Xyz", "lang": "en", "sources": [
            {"id": "123456", "name": "Xyz Scans", "lang": "en", "baseUrl": "https://xyz-scans.example"}
        ]}]"#;
        let fetcher = MockFetcher::with_responses([(config.keiyoushi_urls[0].as_str(), index)]);
        let registry = registry(&fetcher, &config).await;
        let resolution =
            Resolver::new(&registry).resolve_from_name_and_url("XYZ", Some("https://xyz-scans.example/m/1"));
        assert_eq!(resolution.identity.canonical_id, "123456");
    }
}
