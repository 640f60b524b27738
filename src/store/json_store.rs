//! Generic JSON document store with atomic save and backups.

use super::atomic::{sibling, StagedWrite, TEMP_SUFFIX};
use super::backup::{self, BackupEntry, BackupKind, DEFAULT_KEEP_AUTOMATIC};
use super::error::{io_err, StoreError, StoreResult};
use crate::record::{AppConfig, RecordMap};
use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Default primary file of the project database.
pub const DATABASE_FILE: &str = "laserflix_database.json";
/// Default primary file of the application config.
pub const CONFIG_FILE: &str = "laserflix_config.json";
/// Default backup directory, relative to the data directory.
pub const BACKUP_DIR: &str = "laserflix_backups";
/// Subdirectory of the backup directory used by the config store.
pub const CONFIG_BACKUP_SUBDIR: &str = "config";

/// Suffix of the previous-generation copy written by every save.
pub const BAK_SUFFIX: &str = ".bak";
/// Suffix of the snapshot taken before an import or restore.
pub const PRE_IMPORT_SUFFIX: &str = ".pre-import.backup";

/// A document that can live in a [`JsonStore`].
pub trait Document: Serialize + DeserializeOwned + Default {
    /// Human readable name used in log messages.
    const KIND: &'static str;

    /// Repair or upgrade the document after parsing.
    ///
    /// Returns the number of entries that changed.
    fn normalize(&mut self) -> usize {
        0
    }
}

impl Document for RecordMap {
    const KIND: &'static str = "project database";

    fn normalize(&mut self) -> usize {
        self.normalize_records()
    }
}

impl Document for AppConfig {
    const KIND: &'static str = "config";

    fn normalize(&mut self) -> usize {
        self.normalize_entries()
    }
}

/// Where a store keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    /// The primary JSON document.
    pub primary: PathBuf,
    /// Directory for manual and automatic backups.
    pub backup_dir: PathBuf,
    /// Automatic backups kept after rotation.
    pub keep_automatic: usize,
}

impl StoreLayout {
    pub fn new(primary: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            backup_dir: backup_dir.into(),
            keep_automatic: DEFAULT_KEEP_AUTOMATIC,
        }
    }

    /// Default project database layout inside `data_dir`.
    pub fn database_in(data_dir: &Path) -> Self {
        Self::new(data_dir.join(DATABASE_FILE), data_dir.join(BACKUP_DIR))
    }

    /// Default config layout inside `data_dir`.
    pub fn config_in(data_dir: &Path) -> Self {
        Self::new(
            data_dir.join(CONFIG_FILE),
            data_dir.join(BACKUP_DIR).join(CONFIG_BACKUP_SUBDIR),
        )
    }

    #[must_use]
    pub fn with_keep_automatic(mut self, keep: usize) -> Self {
        self.keep_automatic = keep;
        self
    }

    /// `<primary>.bak`
    pub fn bak_path(&self) -> PathBuf {
        sibling(&self.primary, BAK_SUFFIX)
    }

    /// `<primary>.tmp`
    pub fn temp_path(&self) -> PathBuf {
        sibling(&self.primary, TEMP_SUFFIX)
    }

    /// `<primary>.pre-import.backup`
    pub fn pre_import_path(&self) -> PathBuf {
        sibling(&self.primary, PRE_IMPORT_SUFFIX)
    }
}

/// Which file a load was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// No primary file yet; the document is the default.
    Empty,
    /// The primary file parsed.
    Primary,
    /// The primary file was corrupt and the `.bak` generation was used.
    Backup,
}

/// A loaded document and where it came from.
#[derive(Debug)]
pub struct Loaded<T> {
    pub document: T,
    pub source: LoadSource,
    /// Entries changed by [`Document::normalize`].
    pub normalized: usize,
}

/// A JSON file holding one [`Document`], saved atomically with backups.
///
/// # Concurrency
///
/// The store holds no lock. Callers must serialize every
/// mutate-then-save sequence through one owner (for example
/// [`crate::catalog::Catalog`] or a mutex around it). One store instance per
/// file per process; several processes sharing a file is not supported and
/// no file locking is attempted.
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    layout: StoreLayout,
    _doc: PhantomData<fn() -> T>,
}

impl<T: Document> JsonStore<T> {
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            layout,
            _doc: PhantomData,
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// The primary file path.
    pub fn path(&self) -> &Path {
        &self.layout.primary
    }

    /// Load the document, or the default if nothing was saved yet.
    pub fn load(&self) -> StoreResult<T> {
        self.load_with_source().map(|loaded| loaded.document)
    }

    /// Load the document and report which file it came from.
    ///
    /// A corrupt primary falls back to the `.bak` generation. If that is
    /// missing or corrupt too, the primary's parse error is returned.
    pub fn load_with_source(&self) -> StoreResult<Loaded<T>> {
        self.remove_stale_temp();

        let primary = &self.layout.primary;
        if !primary.exists() {
            log::info!(
                "No {} at {}, starting empty",
                T::KIND,
                primary.display()
            );
            return Ok(Loaded {
                document: T::default(),
                source: LoadSource::Empty,
                normalized: 0,
            });
        }

        match read_document::<T>(primary) {
            Ok(document) => Ok(finish_load(document, LoadSource::Primary)),
            Err(err) if err.is_parse() => {
                log::error!("{} is corrupt: {}", T::KIND, err.display_chain());
                let bak = self.layout.bak_path();
                if !bak.exists() {
                    return Err(err);
                }
                match read_document::<T>(&bak) {
                    Ok(document) => {
                        log::warn!(
                            "Recovered {} from previous generation {}",
                            T::KIND,
                            bak.display()
                        );
                        Ok(finish_load(document, LoadSource::Backup))
                    }
                    Err(bak_err) => {
                        log::warn!("Previous generation is unusable too: {}", bak_err.display_chain());
                        Err(err)
                    }
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Serialize the document into the temp sibling without touching the primary.
    ///
    /// This is the first half of [`Self::save`].
    pub fn stage(&self, document: &T) -> StoreResult<StagedWrite> {
        let primary = &self.layout.primary;
        if let Some(parent) = primary.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err("create directory", parent))?;
        }
        let bytes = serde_json::to_vec_pretty(document).map_err(StoreError::Serialize)?;
        StagedWrite::stage(primary, &bytes)
    }

    /// Atomically replace the primary file with `document`.
    ///
    /// The previous primary is copied to `.bak` first; if that copy fails
    /// the save still goes ahead. On error the primary is left untouched.
    pub fn save(&self, document: &T) -> StoreResult<()> {
        let staged = self.stage(document)?;
        self.copy_previous_generation();
        staged.commit()?;
        log::debug!("Saved {} to {}", T::KIND, self.layout.primary.display());
        Ok(())
    }

    /// Copy the primary into the backup directory.
    ///
    /// Returns `None` when there is no primary to back up yet.
    pub fn create_backup(&self, kind: BackupKind) -> StoreResult<Option<PathBuf>> {
        self.create_backup_at(kind, Local::now())
    }

    /// [`Self::create_backup`] with an explicit timestamp for the file name.
    pub fn create_backup_at(
        &self,
        kind: BackupKind,
        at: DateTime<Local>,
    ) -> StoreResult<Option<PathBuf>> {
        let primary = &self.layout.primary;
        if !primary.exists() {
            log::info!("No {} to back up yet", T::KIND);
            return Ok(None);
        }

        let dir = &self.layout.backup_dir;
        fs::create_dir_all(dir).map_err(io_err("create backup directory", dir))?;
        let dest = dir.join(kind.file_name(at));
        fs::copy(primary, &dest).map_err(io_err("write backup", &dest))?;
        log::info!("Created {} backup {}", kind, dest.display());

        if kind == BackupKind::Automatic {
            match backup::rotate(dir, kind, self.layout.keep_automatic) {
                Ok(removed) if !removed.is_empty() => {
                    log::debug!("Removed {} old automatic backups", removed.len())
                }
                Ok(_) => {}
                Err(e) => log::warn!("Backup rotation failed: {}", e.display_chain()),
            }
        }
        Ok(Some(dest))
    }

    /// Backups in this store's backup directory, newest first.
    pub fn list_backups(&self) -> StoreResult<Vec<BackupEntry>> {
        backup::list_backups(&self.layout.backup_dir)
    }

    /// Parse a backup for restoring. `None` if the file does not exist.
    ///
    /// Same contract as [`Self::import_from`]: the current primary is
    /// snapshotted and the caller saves the returned document.
    pub fn restore_backup(&self, backup: &Path) -> StoreResult<Option<T>> {
        if !backup.is_file() {
            log::info!("Backup {} not found", backup.display());
            return Ok(None);
        }
        self.import_from(backup).map(Some)
    }

    /// Copy the primary file byte for byte to `dest`. Returns bytes copied.
    pub fn export_to(&self, dest: &Path) -> StoreResult<u64> {
        let primary = &self.layout.primary;
        if !primary.exists() {
            return Err(StoreError::MissingPrimary(primary.clone()));
        }
        let bytes = fs::copy(primary, dest).map_err(io_err("export to", dest))?;
        log::info!("Exported {} to {}", T::KIND, dest.display());
        Ok(bytes)
    }

    /// Parse `source` as a full document for the caller to save.
    ///
    /// A parse failure has no side effects. Otherwise the current primary
    /// (if any) is copied to `.pre-import.backup` before the document is
    /// returned. The primary itself is never written here.
    pub fn import_from(&self, source: &Path) -> StoreResult<T> {
        let mut document = read_document::<T>(source)?;
        let normalized = document.normalize();
        if normalized > 0 {
            log::info!("Normalized {} entries in {}", normalized, source.display());
        }

        let primary = &self.layout.primary;
        if primary.exists() {
            let snapshot = self.layout.pre_import_path();
            fs::copy(primary, &snapshot).map_err(io_err("snapshot before import", &snapshot))?;
            log::info!("Saved pre-import snapshot {}", snapshot.display());
        }
        Ok(document)
    }

    fn copy_previous_generation(&self) {
        let primary = &self.layout.primary;
        if !primary.exists() {
            return;
        }
        let bak = self.layout.bak_path();
        if let Err(e) = fs::copy(primary, &bak) {
            log::warn!(
                "Failed to keep previous generation at {}: {}",
                bak.display(),
                e
            );
        }
    }

    fn remove_stale_temp(&self) {
        let temp = self.layout.temp_path();
        if !temp.exists() {
            return;
        }
        log::warn!(
            "Removing {} left behind by an interrupted save",
            temp.display()
        );
        if let Err(e) = fs::remove_file(&temp) {
            log::warn!("Failed to remove {}: {}", temp.display(), e);
        }
    }
}

fn read_document<T: Document>(path: &Path) -> StoreResult<T> {
    let bytes = fs::read(path).map_err(io_err("read", path))?;
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn finish_load<T: Document>(mut document: T, source: LoadSource) -> Loaded<T> {
    let normalized = document.normalize();
    if normalized > 0 {
        log::info!("Migrated {} legacy entries in {}", normalized, T::KIND);
    }
    Loaded {
        document,
        source,
        normalized,
    }
}
