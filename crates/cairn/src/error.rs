//! Error types for catalog and index operations.
//!
//! The taxonomy follows how far each failure is allowed to travel:
//!
//! - [`ParseError`]: one malformed record. Contained at the scan boundary
//!   (logged and skipped); only surfaced when a single record is parsed on
//!   request.
//! - [`Error::IndexCorruption`]: the on-disk index is unusable. Contained by
//!   the store, which rebuilds instead.
//! - [`Error::Io`]: filesystem failures while saving or rebuilding.
//! - [`Error::Rebuild`]: a rebuild failed. Nothing is left to fall back to,
//!   so this is the one index failure callers see.

use crate::domain::{ItemId, ItemType};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A single record file could not be parsed.
#[derive(Debug, Error)]
#[error("failed to parse {}: {reason}", path.display())]
pub struct ParseError {
    /// The offending file
    pub path: PathBuf,
    /// What was wrong with it
    pub reason: String,
}

impl ParseError {
    /// Create a parse error for the given file.
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// The error type for cairn operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A record could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The persisted index is structurally invalid.
    #[error("index at {} is corrupt: {reason}", path.display())]
    IndexCorruption {
        /// Location of the index file
        path: PathBuf,
        /// What failed validation
        reason: String,
    },

    /// Rebuilding the index from the record files failed.
    #[error("index rebuild failed: {0}")]
    Rebuild(#[source] Box<Error>),

    /// Serializing the index failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A record file declares a different ID than the one requested.
    #[error("{item_type} file {} declares id '{found}', expected '{expected}'", path.display())]
    IdMismatch {
        /// Type of the requested item
        item_type: ItemType,
        /// ID the caller asked for
        expected: ItemId,
        /// ID found in the file header
        found: ItemId,
        /// The file that was read
        path: PathBuf,
    },

    /// Item not found in the index.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),
}

impl From<cairn_frontmatter::Error> for Error {
    fn from(err: cairn_frontmatter::Error) -> Self {
        match err {
            cairn_frontmatter::Error::Io(io_err) => Error::Io(io_err),
            cairn_frontmatter::Error::Json(json_err) => Error::Serialization(json_err),
            other => Error::Io(io::Error::new(io::ErrorKind::InvalidData, other.to_string())),
        }
    }
}

/// A specialized Result type for cairn operations.
pub type Result<T> = std::result::Result<T, Error>;
