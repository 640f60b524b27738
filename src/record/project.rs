//! Project records and the record map.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_map::{self, BTreeMap};
use std::path::Path;

/// Category value older databases used for "no category".
pub const UNCATEGORIZED: &str = "Diversos";

/// Boolean flags a user can set on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Marked as favorite.
    Favorite,
    /// Marked as already produced.
    Done,
    /// Rated good. Exclusive with [`Flag::Bad`].
    Good,
    /// Rated bad. Exclusive with [`Flag::Good`].
    Bad,
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Favorite => write!(f, "favorite"),
            Self::Done => write!(f, "done"),
            Self::Good => write!(f, "good"),
            Self::Bad => write!(f, "bad"),
        }
    }
}

/// One catalog entry describing a scanned project folder.
///
/// The `path` is the key of the record in the [`RecordMap`] and is not
/// repeated inside the serialized object. `good` and `bad` are private so
/// that their mutual exclusion can only be changed through [`Self::set_flag`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(skip)]
    path: String,
    /// Display name, usually derived from the folder name.
    #[serde(default)]
    pub name: String,
    /// Where the design came from (vendor, site, pack).
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    good: bool,
    #[serde(default)]
    bad: bool,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Set once analysis produced categories and tags.
    #[serde(default)]
    pub analyzed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<String>,
    /// Singular category written by older versions. Read, never written.
    #[serde(default, rename = "category", skip_serializing)]
    legacy_category: Option<String>,
    /// Fields this version does not know about, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProjectRecord {
    /// Create an empty record for a project folder.
    ///
    /// The name defaults to the last path component.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = Path::new(&path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        Self {
            path,
            name,
            ..Self::default()
        }
    }

    /// The folder path identifying this record.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_good(&self) -> bool {
        self.good
    }

    pub fn is_bad(&self) -> bool {
        self.bad
    }

    /// Read a flag.
    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::Favorite => self.favorite,
            Flag::Done => self.done,
            Flag::Good => self.good,
            Flag::Bad => self.bad,
        }
    }

    /// Set a flag, keeping `good` and `bad` mutually exclusive.
    ///
    /// Turning `good` on clears `bad` and vice versa. Turning either off
    /// leaves the other one alone.
    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        match flag {
            Flag::Favorite => self.favorite = value,
            Flag::Done => self.done = value,
            Flag::Good => {
                self.good = value;
                if value {
                    self.bad = false;
                }
            }
            Flag::Bad => {
                self.bad = value;
                if value {
                    self.good = false;
                }
            }
        }
    }

    /// Flip a flag and return its new value.
    pub fn toggle_flag(&mut self, flag: Flag) -> bool {
        let value = !self.flag(flag);
        self.set_flag(flag, value);
        value
    }

    /// Fold the legacy singular `category` into `categories`.
    ///
    /// Returns `true` if the record carried the legacy field.
    pub fn migrate_legacy(&mut self) -> bool {
        match self.legacy_category.take() {
            Some(category) => {
                if self.categories.is_empty() {
                    self.categories = migrate_legacy_category(&category);
                }
                true
            }
            None => false,
        }
    }

    /// Whether the record still carries the legacy `category` field.
    pub fn has_legacy_category(&self) -> bool {
        self.legacy_category.is_some()
    }
}

/// Category list that replaces a legacy singular `category` value.
///
/// The uncategorized sentinel and blank values map to an empty list.
pub fn migrate_legacy_category(category: &str) -> Vec<String> {
    let category = category.trim();
    if category.is_empty() || category == UNCATEGORIZED {
        Vec::new()
    } else {
        vec![category.to_string()]
    }
}

/// The full project database: folder path to record.
///
/// Serialized as a plain JSON object keyed by path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordMap(BTreeMap<String, ProjectRecord>);

impl RecordMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its own path, returning the record it replaced.
    pub fn insert(&mut self, record: ProjectRecord) -> Option<ProjectRecord> {
        self.0.insert(record.path.clone(), record)
    }

    pub fn get(&self, path: &str) -> Option<&ProjectRecord> {
        self.0.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut ProjectRecord> {
        self.0.get_mut(path)
    }

    pub fn remove(&mut self, path: &str) -> Option<ProjectRecord> {
        self.0.remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Records in path order.
    pub fn iter(&self) -> btree_map::Values<'_, String, ProjectRecord> {
        self.0.values()
    }

    /// Fill record paths from their keys and migrate legacy fields.
    ///
    /// Returns the number of records that were migrated.
    pub(crate) fn normalize_records(&mut self) -> usize {
        let mut migrated = 0;
        for (key, record) in self.0.iter_mut() {
            if record.path != *key {
                record.path = key.clone();
            }
            if record.migrate_legacy() {
                migrated += 1;
            }
        }
        migrated
    }
}

impl FromIterator<ProjectRecord> for RecordMap {
    fn from_iter<I: IntoIterator<Item = ProjectRecord>>(iter: I) -> Self {
        let mut map = Self::new();
        for record in iter {
            map.insert(record);
        }
        map
    }
}

impl<'a> IntoIterator for &'a RecordMap {
    type Item = &'a ProjectRecord;
    type IntoIter = btree_map::Values<'a, String, ProjectRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.values()
    }
}
