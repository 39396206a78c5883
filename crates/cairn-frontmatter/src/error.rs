//! Error types for cairn-frontmatter operations.

use std::io;
use thiserror::Error;

/// The error type for cairn-frontmatter operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The YAML header could not be deserialized into the requested type.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document does not start with a `---` header delimiter.
    #[error("missing front-matter header")]
    MissingHeader,

    /// The header was opened but never closed.
    #[error("front-matter header opened on line 1 is never closed")]
    UnterminatedHeader,
}

/// A specialized Result type for cairn-frontmatter operations.
pub type Result<T> = std::result::Result<T, Error>;
