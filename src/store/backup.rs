//! Timestamped backup files and their rotation.

use super::error::{io_err, StoreResult};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Timestamp format used in backup file names. Sorts chronologically by name.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Number of automatic backups kept after rotation.
pub const DEFAULT_KEEP_AUTOMATIC: usize = 10;

const BACKUP_EXTENSION: &str = ".json";

/// Who asked for a backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    /// Explicit user request. Never rotated.
    Manual,
    /// Created by the periodic timer. Rotated to the newest N.
    Automatic,
}

impl BackupKind {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Manual => "manual_backup_",
            Self::Automatic => "auto_backup_",
        }
    }

    /// File name for a backup of this kind taken at `at`.
    pub fn file_name(self, at: DateTime<Local>) -> String {
        format!(
            "{}{}{}",
            self.prefix(),
            at.format(TIMESTAMP_FORMAT),
            BACKUP_EXTENSION
        )
    }

    fn matches(self, name: &str) -> bool {
        name.starts_with(self.prefix()) && name.ends_with(BACKUP_EXTENSION)
    }
}

impl std::fmt::Display for BackupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Automatic => write!(f, "automatic"),
        }
    }
}

/// A backup file found in the backup directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub kind: BackupKind,
    pub created: NaiveDateTime,
}

impl BackupEntry {
    /// Parse a backup file name. Returns `None` for unrelated files.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let kind = [BackupKind::Manual, BackupKind::Automatic]
            .into_iter()
            .find(|k| k.matches(name))?;
        let stamp = &name[kind.prefix().len()..name.len() - BACKUP_EXTENSION.len()];
        let created = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
        Some(Self {
            path: path.to_path_buf(),
            kind,
            created,
        })
    }
}

/// All recognizable backups in `dir`, newest first. A missing directory is empty.
pub fn list_backups(dir: &Path) -> StoreResult<Vec<BackupEntry>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries: Vec<BackupEntry> = fs::read_dir(dir)
        .map_err(io_err("read backup directory", dir))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| BackupEntry::from_path(&entry.path()))
        .collect();
    entries.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.path.cmp(&a.path)));
    Ok(entries)
}

/// Delete all but the newest `keep` backups of `kind` in `dir`.
///
/// Files are ordered by name. A file that cannot be deleted is logged and
/// skipped. Returns the paths that were removed.
pub fn rotate(dir: &Path, kind: BackupKind, keep: usize) -> StoreResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err("read backup directory", dir))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| kind.matches(n))
        })
        .collect();
    files.sort();

    let excess = files.len().saturating_sub(keep);
    let mut removed = Vec::with_capacity(excess);
    for path in files.into_iter().take(excess) {
        match fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Rotated out old backup {}", path.display());
                removed.push(path);
            }
            Err(e) => log::warn!("Failed to remove old backup {}: {}", path.display(), e),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at(secs: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 12, 24, 10, 0, 0)
            .single()
            .unwrap()
            + chrono::Duration::seconds(i64::from(secs))
    }

    #[test]
    fn test_file_name_format() {
        assert_eq!(
            BackupKind::Automatic.file_name(at(5)),
            "auto_backup_20241224_100005.json"
        );
        assert_eq!(
            BackupKind::Manual.file_name(at(0)),
            "manual_backup_20241224_100000.json"
        );
    }

    #[test]
    fn test_entry_from_path() {
        let entry = BackupEntry::from_path(Path::new("/b/manual_backup_20240101_235959.json")).unwrap();
        assert_eq!(entry.kind, BackupKind::Manual);
        assert_eq!(entry.created.format(TIMESTAMP_FORMAT).to_string(), "20240101_235959");

        assert!(BackupEntry::from_path(Path::new("/b/notes.txt")).is_none());
        assert!(BackupEntry::from_path(Path::new("/b/auto_backup_garbage.json")).is_none());
    }

    #[test]
    fn test_rotate_keeps_newest() {
        let dir = tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(BackupKind::Automatic.file_name(at(i))), "{}").unwrap();
        }
        fs::write(dir.path().join(BackupKind::Manual.file_name(at(0))), "{}").unwrap();

        let removed = rotate(dir.path(), BackupKind::Automatic, 2).unwrap();
        assert_eq!(removed.len(), 3);

        let left = list_backups(dir.path()).unwrap();
        let autos: Vec<_> = left
            .iter()
            .filter(|e| e.kind == BackupKind::Automatic)
            .map(|e| e.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            autos,
            vec![
                "auto_backup_20241224_100004.json".to_string(),
                "auto_backup_20241224_100003.json".to_string()
            ]
        );
        assert_eq!(left.iter().filter(|e| e.kind == BackupKind::Manual).count(), 1);
    }

    #[test]
    fn test_list_missing_directory() {
        let dir = tempdir().unwrap();
        assert!(list_backups(&dir.path().join("nope")).unwrap().is_empty());
    }
}
