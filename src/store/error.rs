//! Errors reported by the JSON stores.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading or writing a store.
///
/// Absence is not an error: a missing primary file loads as an empty
/// document and a missing backup restores as `None`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A filesystem operation failed (disk full, permission denied, path vanished).
    #[error("Failed to {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid JSON or does not have the expected shape.
    #[error("Failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory document could not be serialized.
    #[error("Failed to serialize document")]
    Serialize(#[source] serde_json::Error),

    /// An operation needed the primary file but none has been saved yet.
    #[error("No database file exists at {}", .0.display())]
    MissingPrimary(PathBuf),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Returns true if the error came from malformed file contents.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// The message followed by its causes, for log lines.
    pub fn display_chain(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

/// Build a `map_err` adapter that tags an I/O error with the action and path.
pub(crate) fn io_err(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io {
        action,
        path,
        source,
    }
}
