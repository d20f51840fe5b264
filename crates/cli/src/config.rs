//! CLI configuration: command-line flags layered over an optional
//! config file in the user config directory.

use std::path::PathBuf;

use serde::Deserialize;
use store::{CacheConfig, Database, FileStore, FileStoreConfig, Visibility};

/// On-disk config file (`<config dir>/rowfs/config.toml`); every field
/// is optional and loses to the matching command-line flag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub database: Option<PathBuf>,
    pub bucket: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub default_visibility: Option<String>,
}

impl FileConfig {
    pub fn load() -> Self {
        let Some(path) = dirs::config_dir().map(|dir| dir.join("rowfs").join("config.toml"))
        else {
            return Self::default();
        };
        let Ok(raw) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match toml::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                Self::default()
            }
        }
    }
}

/// Flag values that override the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub bucket: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

/// Resolve settings and open the store.
pub async fn open_store(overrides: Overrides) -> anyhow::Result<FileStore> {
    let file = FileConfig::load();

    let database = overrides.database.or(file.database).unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("rowfs")
            .join("files.db")
    });
    let cache_dir = overrides.cache_dir.or(file.cache_dir).unwrap_or_else(|| {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("rowfs")
    });
    let bucket = overrides
        .bucket
        .or(file.bucket)
        .unwrap_or_else(|| "default".to_string());
    let default_visibility: Visibility = file
        .default_visibility
        .as_deref()
        .unwrap_or("public")
        .parse()
        .unwrap();

    tracing::debug!(database = %database.display(), bucket = %bucket, "opening store");
    let db = Database::new(&database).await?;

    Ok(FileStore::new(
        db,
        FileStoreConfig {
            bucket,
            default_visibility,
            cache: CacheConfig {
                directory: cache_dir,
                ..CacheConfig::default()
            },
        },
    ))
}
