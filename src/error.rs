//! Error types for the vault-dedupe library.

use std::fmt;

use thiserror::Error;

/// The two operations issued against the external vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultOperation {
    Edit,
    Archive,
}

impl fmt::Display for VaultOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultOperation::Edit => f.write_str("edit"),
            VaultOperation::Archive => f.write_str("archive"),
        }
    }
}

/// Errors that can occur while normalizing, merging or applying records.
#[derive(Error, Debug, Clone)]
pub enum VaultError {
    /// Empty input, missing hostname or no registrable domain
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed URL structure
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The vault collaborator rejected an edit or archive.
    ///
    /// `archived` lists the records archived before the failure; they are
    /// not rolled back.
    #[error("failed to {operation} item {record_id}: {message}")]
    ExternalOperation {
        operation: VaultOperation,
        record_id: String,
        archived: Vec<String>,
        message: String,
    },

    /// A vault command could not be started or exited unsuccessfully
    #[error("Command failed: {0}")]
    Command(String),

    /// Local I/O failure (temp files, terminal)
    #[error("I/O error: {0}")]
    Io(String),

    /// Error serializing/deserializing JSON
    #[error("JSON error: {0}")]
    JsonError(String),

    /// General error
    #[error("Error: {0}")]
    General(String),
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::Io(err.to_string())
    }
}

/// Result type alias for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;
