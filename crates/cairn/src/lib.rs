//! Cairn - a plain-text work item catalog.
//!
//! Projects, epics, issues, tasks and pull requests are stored as one
//! front-matter record file each. This crate maintains a derived, cached
//! index over those files and provides both a CLI application and a
//! library for querying it.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod index;
pub mod parser;
pub mod scanner;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;

// Internal modules (not exposed as public API)
pub(crate) mod output;
