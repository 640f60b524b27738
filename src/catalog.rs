//! The in-memory project catalog and its store.
//!
//! [`Catalog`] is the single owner of the record map. Scan, analysis and UI
//! code receive it by reference (or through a [`crate::dispatch::Dispatcher`])
//! instead of touching shared global state, which also gives the store the
//! serialized mutate-then-save sequence it requires.

use crate::record::{Flag, ProjectRecord, RecordFilter, RecordMap};
use crate::store::{BackupKind, LoadSource, RecordStore, StoreResult};
use std::path::{Path, PathBuf};

/// Records plus the store they are persisted in.
#[derive(Debug)]
pub struct Catalog {
    store: RecordStore,
    records: RecordMap,
    dirty: bool,
}

impl Catalog {
    /// Load the catalog from its store.
    ///
    /// Records migrated from the legacy format mark the catalog dirty so
    /// the next save persists the migration.
    pub fn open(store: RecordStore) -> StoreResult<(Self, LoadSource)> {
        let loaded = store.load_with_source()?;
        let catalog = Self {
            store,
            records: loaded.document,
            dirty: loaded.normalized > 0,
        };
        Ok((catalog, loaded.source))
    }

    /// Build the catalog by importing `source` over the store.
    ///
    /// Unlike [`Self::open`] the current primary is never parsed, so a
    /// corrupt database can still be replaced. It is kept in the
    /// pre-import snapshot.
    pub fn import_into(store: RecordStore, source: &Path) -> StoreResult<Self> {
        let records = store.import_from(source)?;
        Self::replaced(store, records)
    }

    /// Build the catalog from a backup without loading the current primary.
    ///
    /// `None` if the backup does not exist; nothing is written then.
    pub fn restore_into(store: RecordStore, backup: &Path) -> StoreResult<Option<Self>> {
        match store.restore_backup(backup)? {
            Some(records) => Self::replaced(store, records).map(Some),
            None => Ok(None),
        }
    }

    fn replaced(store: RecordStore, records: RecordMap) -> StoreResult<Self> {
        store.save(&records)?;
        Ok(Self {
            store,
            records,
            dirty: false,
        })
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn records(&self) -> &RecordMap {
        &self.records
    }

    pub fn record(&self, path: &str) -> Option<&ProjectRecord> {
        self.records.get(path)
    }

    /// Whether there are changes that have not been saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn filter(&self, filter: &RecordFilter) -> Vec<&ProjectRecord> {
        self.records.filter(filter)
    }

    /// Insert or replace a record.
    pub fn upsert(&mut self, record: ProjectRecord) -> Option<ProjectRecord> {
        self.dirty = true;
        self.records.insert(record)
    }

    pub fn remove(&mut self, path: &str) -> Option<ProjectRecord> {
        let removed = self.records.remove(path);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Apply `f` to the record at `path`. Returns false if there is none.
    pub fn update<F>(&mut self, path: &str, f: F) -> bool
    where
        F: FnOnce(&mut ProjectRecord),
    {
        match self.records.get_mut(path) {
            Some(record) => {
                f(record);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Set a flag on a record. Returns false if there is no such record.
    pub fn set_flag(&mut self, path: &str, flag: Flag, value: bool) -> bool {
        self.update(path, |record| record.set_flag(flag, value))
    }

    /// Flip a flag on a record, returning the new value.
    pub fn toggle_flag(&mut self, path: &str, flag: Flag) -> Option<bool> {
        let mut value = None;
        self.update(path, |record| value = Some(record.toggle_flag(flag)));
        value
    }

    /// Persist the records. On failure they stay in memory and stay dirty.
    pub fn save(&mut self) -> StoreResult<()> {
        self.store.save(&self.records)?;
        self.dirty = false;
        Ok(())
    }

    pub fn backup(&self, kind: BackupKind) -> StoreResult<Option<PathBuf>> {
        self.store.create_backup(kind)
    }

    pub fn export_to(&self, dest: &Path) -> StoreResult<u64> {
        self.store.export_to(dest)
    }

    /// Replace the catalog with the contents of `source`.
    ///
    /// The imported records are saved before they replace the in-memory
    /// map, so a failed save leaves the catalog as it was. Returns the
    /// number of imported records.
    pub fn import_from(&mut self, source: &Path) -> StoreResult<usize> {
        let records = self.store.import_from(source)?;
        self.replace(records)
    }

    /// Replace the catalog with a backup. `None` if the backup does not exist.
    pub fn restore_backup(&mut self, backup: &Path) -> StoreResult<Option<usize>> {
        match self.store.restore_backup(backup)? {
            Some(records) => self.replace(records).map(Some),
            None => Ok(None),
        }
    }

    fn replace(&mut self, records: RecordMap) -> StoreResult<usize> {
        self.store.save(&records)?;
        let count = records.len();
        self.records = records;
        self.dirty = false;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreLayout;
    use std::fs;
    use tempfile::tempdir;

    fn open_in(dir: &Path) -> Catalog {
        Catalog::open(RecordStore::new(StoreLayout::database_in(dir)))
            .unwrap()
            .0
    }

    #[test]
    fn test_mutations_mark_dirty() {
        let dir = tempdir().unwrap();
        let mut catalog = open_in(dir.path());
        assert!(!catalog.is_dirty());

        catalog.upsert(ProjectRecord::new("/p/a"));
        assert!(catalog.is_dirty());
        catalog.save().unwrap();
        assert!(!catalog.is_dirty());

        assert_eq!(catalog.toggle_flag("/p/a", Flag::Favorite), Some(true));
        assert!(catalog.is_dirty());
        assert_eq!(catalog.toggle_flag("/p/missing", Flag::Favorite), None);
    }

    #[test]
    fn test_reopen_sees_saved_flags() {
        let dir = tempdir().unwrap();
        let mut catalog = open_in(dir.path());
        catalog.upsert(ProjectRecord::new("/p/a"));
        catalog.set_flag("/p/a", Flag::Bad, true);
        catalog.set_flag("/p/a", Flag::Good, true);
        catalog.save().unwrap();

        let reopened = open_in(dir.path());
        let record = reopened.record("/p/a").unwrap();
        assert!(record.is_good());
        assert!(!record.is_bad());
    }

    #[test]
    fn test_legacy_load_marks_dirty() {
        let dir = tempdir().unwrap();
        let layout = StoreLayout::database_in(dir.path());
        fs::write(&layout.primary, r#"{"/p/a": {"category": "Natal"}}"#).unwrap();

        let catalog = open_in(dir.path());
        assert!(catalog.is_dirty());
        assert_eq!(catalog.record("/p/a").unwrap().categories, vec!["Natal".to_string()]);
    }

    #[test]
    fn test_failed_import_keeps_records() {
        let dir = tempdir().unwrap();
        let mut catalog = open_in(dir.path());
        catalog.upsert(ProjectRecord::new("/p/a"));
        catalog.save().unwrap();

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "[]").unwrap();
        assert!(catalog.import_from(&bad).is_err());
        assert!(catalog.record("/p/a").is_some());
        assert!(!catalog.store().layout().pre_import_path().exists());
    }

    #[test]
    fn test_restore_missing_backup() {
        let dir = tempdir().unwrap();
        let mut catalog = open_in(dir.path());
        let result = catalog.restore_backup(&dir.path().join("nope.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_restore_into_replaces_corrupt_primary() {
        let dir = tempdir().unwrap();
        let mut catalog = open_in(dir.path());
        catalog.upsert(ProjectRecord::new("/p/a"));
        catalog.save().unwrap();
        let backup = catalog.backup(BackupKind::Manual).unwrap().unwrap();

        let layout = StoreLayout::database_in(dir.path());
        fs::write(&layout.primary, "{ truncated").unwrap();
        assert!(Catalog::open(RecordStore::new(layout.clone())).is_err());

        let restored = Catalog::restore_into(RecordStore::new(layout.clone()), &backup)
            .unwrap()
            .unwrap();
        assert!(restored.record("/p/a").is_some());
        assert!(!restored.is_dirty());
        assert_eq!(fs::read_to_string(layout.pre_import_path()).unwrap(), "{ truncated");
        assert!(open_in(dir.path()).record("/p/a").is_some());
    }

    #[test]
    fn test_import_into_missing_source_writes_nothing() {
        let dir = tempdir().unwrap();
        let layout = StoreLayout::database_in(dir.path());
        fs::write(&layout.primary, "{ truncated").unwrap();

        let missing = dir.path().join("nope.json");
        assert!(Catalog::import_into(RecordStore::new(layout.clone()), &missing).is_err());
        assert_eq!(fs::read_to_string(&layout.primary).unwrap(), "{ truncated");
        assert!(Catalog::restore_into(RecordStore::new(layout), &missing)
            .unwrap()
            .is_none());
    }
}
