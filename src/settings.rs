//! Application settings management.
//!
//! Settings decide where the stores live and how the caches are sized.
//! They are layered with figment:
//!
//! 1. Built-in defaults
//! 2. `laserflix.toml` in the platform config directory (or `--config`)
//! 3. `LASERFLIX_*` environment variables (`__` separates nested keys,
//!    e.g. `LASERFLIX_THUMBNAILS__CAPACITY=500`)
//! 4. CLI flags, applied by the caller
//!
//! These are distinct from `laserflix_config.json`, the folder list and
//! model map kept in a [`crate::store::ConfigStore`].

use crate::schedule::DEFAULT_BACKUP_INTERVAL;
use crate::store::json_store::{BACKUP_DIR, CONFIG_BACKUP_SUBDIR, CONFIG_FILE, DATABASE_FILE};
use crate::store::{StoreLayout, DEFAULT_KEEP_AUTOMATIC};
use crate::thumbnail::{ThumbnailSize, DEFAULT_CAPACITY};
use anyhow::{bail, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment variables that override settings.
pub const ENV_PREFIX: &str = "LASERFLIX_";

/// Name of the settings file in the platform config directory.
pub const SETTINGS_FILE: &str = "laserflix.toml";

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the database, config and backups.
    pub data_dir: PathBuf,
    /// Database file name inside `data_dir`.
    pub database_file: String,
    /// Config file name inside `data_dir`.
    pub config_file: String,
    /// Backup directory name inside `data_dir`.
    pub backup_dir: String,
    pub thumbnails: ThumbnailSettings,
    pub backups: BackupSettings,
}

/// Thumbnail cache sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailSettings {
    /// Maximum number of decoded thumbnails kept in memory.
    pub capacity: usize,
    pub width: u32,
    pub height: u32,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        let size = ThumbnailSize::default();
        Self {
            capacity: DEFAULT_CAPACITY,
            width: size.width,
            height: size.height,
        }
    }
}

/// Backup policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSettings {
    /// Automatic backups kept after rotation.
    pub keep_automatic: usize,
    /// Minutes between automatic backups.
    pub interval_minutes: u64,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            keep_automatic: DEFAULT_KEEP_AUTOMATIC,
            interval_minutes: DEFAULT_BACKUP_INTERVAL.as_secs() / 60,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: DATABASE_FILE.to_string(),
            config_file: CONFIG_FILE.to_string(),
            backup_dir: BACKUP_DIR.to_string(),
            thumbnails: ThumbnailSettings::default(),
            backups: BackupSettings::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "laserflix", "laserflix")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Settings {
    /// Load settings from the default platform-specific path.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from_path(path),
            None => Self::extract_or_default(Self::figment(None), "environment"),
        }
    }

    /// Load settings layered over the given TOML file.
    ///
    /// A missing file contributes nothing. A malformed one is logged and
    /// the defaults are used instead.
    pub fn load_from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::extract_or_default(Self::figment(Some(path)), &path.display().to_string())
    }

    /// Like [`Self::load_from_path`] but reports errors instead of falling back.
    pub fn try_load_from_path(path: Option<&Path>) -> Result<Self> {
        let settings: Self = Self::figment(path).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    fn extract_or_default(figment: Figment, source: &str) -> Self {
        match figment.extract::<Self>() {
            Ok(settings) => match settings.validate() {
                Ok(()) => settings,
                Err(e) => {
                    log::warn!("Ignoring invalid settings from {}: {}", source, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to load settings from {}, using defaults: {}", source, e);
                Self::default()
            }
        }
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Default platform-specific settings path.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "laserflix", "laserflix")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    /// Reject values the stores and caches cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.database_file.trim().is_empty() {
            bail!("database_file must not be empty");
        }
        if self.config_file.trim().is_empty() {
            bail!("config_file must not be empty");
        }
        if self.database_file == self.config_file {
            bail!("database_file and config_file must differ");
        }
        if self.thumbnails.capacity == 0 {
            bail!("thumbnails.capacity must be at least 1");
        }
        if self.thumbnails.width == 0 || self.thumbnails.height == 0 {
            bail!("thumbnail width and height must be at least 1");
        }
        if self.backups.keep_automatic == 0 {
            bail!("backups.keep_automatic must be at least 1");
        }
        if self.backups.interval_minutes == 0 {
            bail!("backups.interval_minutes must be at least 1");
        }
        Ok(())
    }

    /// Layout of the project database store.
    pub fn database_layout(&self) -> StoreLayout {
        StoreLayout::new(
            self.data_dir.join(&self.database_file),
            self.data_dir.join(&self.backup_dir),
        )
        .with_keep_automatic(self.backups.keep_automatic)
    }

    /// Layout of the config store. Its backups live in their own subdirectory.
    pub fn config_layout(&self) -> StoreLayout {
        StoreLayout::new(
            self.data_dir.join(&self.config_file),
            self.data_dir.join(&self.backup_dir).join(CONFIG_BACKUP_SUBDIR),
        )
        .with_keep_automatic(self.backups.keep_automatic)
    }

    pub fn thumbnail_size(&self) -> ThumbnailSize {
        ThumbnailSize::new(self.thumbnails.width, self.thumbnails.height)
    }

    pub fn backup_interval(&self) -> Duration {
        Duration::from_secs(self.backups.interval_minutes.saturating_mul(60))
    }

    /// Render as a TOML document that [`Self::load_from_path`] reads back.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.thumbnails.capacity, 300);
        assert_eq!(settings.backups.keep_automatic, 10);
        assert_eq!(settings.backup_interval(), Duration::from_secs(1800));
    }

    #[test]
    fn test_layouts_follow_data_dir() {
        let settings = Settings {
            data_dir: PathBuf::from("/data"),
            ..Settings::default()
        };
        let db = settings.database_layout();
        assert_eq!(db.primary, PathBuf::from("/data/laserflix_database.json"));
        assert_eq!(db.backup_dir, PathBuf::from("/data/laserflix_backups"));
        let config = settings.config_layout();
        assert_eq!(config.primary, PathBuf::from("/data/laserflix_config.json"));
        assert_eq!(config.backup_dir, PathBuf::from("/data/laserflix_backups/config"));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut settings = Settings::default();
        settings.thumbnails.capacity = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_same_file_names() {
        let mut settings = Settings::default();
        settings.config_file = settings.database_file.clone();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_to_toml_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings {
            data_dir: dir.path().join("data"),
            ..Settings::default()
        };
        settings.thumbnails.width = 128;
        let text = settings.to_toml().unwrap();
        assert!(text.contains("[thumbnails]"));

        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, text).unwrap();
        let loaded = Settings::try_load_from_path(Some(path.as_path())).unwrap();
        assert_eq!(loaded.data_dir, settings.data_dir);
        assert_eq!(loaded.thumbnails, settings.thumbnails);
    }
}
