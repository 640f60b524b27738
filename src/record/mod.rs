//! Catalog data model.
//!
//! This module defines the documents persisted by the stores:
//!
//! * [`project`]: [`ProjectRecord`] and the [`RecordMap`] that forms the project database.
//! * [`filter`]: Filter criteria and summary counts used by the browsing grid.
//! * [`app_config`]: [`AppConfig`], the folder list and model name map.
//!
//! # Legacy Records
//!
//! Older databases stored a single `category` string per record. Such records
//! are migrated to the `categories` list when the database is loaded; the
//! singular field is never written back.

pub mod app_config;
pub mod filter;
pub mod project;

pub use app_config::AppConfig;
pub use filter::{CatalogStats, Rating, RecordFilter};
pub use project::{migrate_legacy_category, Flag, ProjectRecord, RecordMap, UNCATEGORIZED};
