//! Front-matter documents and crash-safe file replacement.
//!
//! This library provides parsing of YAML front-matter documents (a header
//! fenced by `---` lines followed by a free-form body), warning collection
//! for resilient bulk reads, and atomic whole-file replacement.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod document;
pub mod error;
pub mod warning;

pub use atomic::{StagedWrite, stage, write_atomic, write_json_atomic};
pub use document::{Document, parse_document, read_document, split_front_matter};
pub use error::{Error, Result};
pub use warning::{Warning, WarningCollector};
