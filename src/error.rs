//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the Laserflix CLI.
///
/// - 0: Success
/// - 1: General error (I/O failure, corrupt file that could not be recovered)
/// - 2: Not found (no such record, no backup available, no thumbnail)
/// - 3: Degraded (completed, but the database was recovered from `.bak`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the command completed normally.
    Success = 0,
    /// General error: an unexpected failure.
    GeneralError = 1,
    /// Not found: the requested item does not exist.
    NotFound = 2,
    /// Degraded: completed after recovering the database from its previous generation.
    Degraded = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "LF000",
            Self::GeneralError => "LF001",
            Self::NotFound => "LF002",
            Self::Degraded => "LF003",
        }
    }
}

/// Structured error information for `--json-errors` output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "LF001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
        }
    }
}
