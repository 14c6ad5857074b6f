//! Error types for vault operations.
//!
//! Follows ODF-REP: Library crates use `thiserror` for explicit error enums.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Error types for vault operations.
///
/// Path and existence errors abort the single call they belong to.
/// Per-note index failures are collected on the snapshot instead of raised.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Root directory lacks the sentinel subdirectory.
    #[error("Not a vault: {} (missing '{sentinel}' directory)", root.display())]
    InvalidVault {
        /// Directory that was opened.
        root: PathBuf,
        /// Sentinel directory name that was expected.
        sentinel: String,
    },

    /// Resolved path lies outside the vault root.
    #[error("Path escapes vault root: {0}")]
    PathEscape(String),

    /// Identifier is empty after trimming.
    #[error("Invalid note identifier: '{0}'")]
    InvalidIdentifier(String),

    /// Read or update on a note that does not exist.
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// Create on an identifier that already exists.
    #[error("Note already exists: {0}")]
    NoteAlreadyExists(String),

    /// Header block present but not a decodable YAML mapping.
    #[error("Invalid metadata in {location}: {reason}")]
    InvalidMetadata {
        /// Note location relative to the vault root.
        location: String,
        /// Decoder message.
        reason: String,
    },

    /// One note could not be read during a bulk index build.
    #[error("Failed to index {}: {reason}", path.display())]
    PerNoteIndexFailure {
        /// Absolute path of the note.
        path: PathBuf,
        /// Underlying failure.
        reason: String,
    },

    /// Settings failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Embedding or chunk store collaborator failed.
    #[error("Semantic indexing failed: {0}")]
    Semantic(String),

    /// Low-level I/O error from std::io.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
