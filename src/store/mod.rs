//! Crash-safe JSON persistence for the project database and config.
//!
//! Both files go through the same [`JsonStore`], parameterized only by
//! file layout and document type.
//!
//! # Architecture
//!
//! * [`atomic`]: Temp-file-then-rename writes ([`StagedWrite`]).
//! * [`backup`]: Timestamped manual and automatic backups, rotation and listing.
//! * [`json_store`]: Load with `.bak` recovery, save, import, export and restore.
//! * [`error`]: The [`StoreError`] taxonomy.
//!
//! # Save Protocol
//!
//! 1. Serialize to `<primary>.tmp` in the same directory and sync it.
//! 2. Copy the existing primary to `<primary>.bak` (a failure here is only logged).
//! 3. Rename the temp file over the primary.
//! 4. On any failure the temp file is removed and the primary is untouched.
//!
//! At every point the primary holds either the previous or the new complete
//! document, never a partial write.

pub mod atomic;
pub mod backup;
pub mod error;
pub mod json_store;

pub use atomic::StagedWrite;
pub use backup::{BackupEntry, BackupKind, DEFAULT_KEEP_AUTOMATIC};
pub use error::{StoreError, StoreResult};
pub use json_store::{Document, JsonStore, LoadSource, Loaded, StoreLayout};

use crate::record::{AppConfig, RecordMap};

/// Store for the project database (`laserflix_database.json`).
pub type RecordStore = JsonStore<RecordMap>;

/// Store for the application config (`laserflix_config.json`).
pub type ConfigStore = JsonStore<AppConfig>;
