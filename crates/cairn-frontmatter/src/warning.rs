//! Warning types for non-fatal errors while reading many documents.
//!
//! When a directory of front-matter documents is read in bulk, one broken
//! file must not abort the whole read. The [`Warning`] type describes such a
//! skipped file, and the [`WarningCollector`] accumulates warnings across
//! concurrently running reads.
//!
//! # Examples
//!
//! ```
//! use cairn_frontmatter::warning::{Warning, WarningCollector};
//! use std::path::PathBuf;
//!
//! let collector = WarningCollector::new();
//!
//! collector.add(Warning::MalformedDocument {
//!     path: PathBuf::from("issues/ISS-1.md"),
//!     error: "missing front-matter header".to_string(),
//! });
//!
//! let warnings = collector.into_warnings();
//! assert_eq!(warnings.len(), 1);
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A non-fatal warning about a single document that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The file could not be read at all (permissions, invalid UTF-8, ...).
    Unreadable {
        /// The file that was skipped.
        path: PathBuf,
        /// A description of the I/O error.
        error: String,
    },

    /// The file was read but its header is missing, malformed, or lacks a
    /// required field.
    MalformedDocument {
        /// The file that was skipped.
        path: PathBuf,
        /// A description of the parse error.
        error: String,
    },
}

impl Warning {
    /// Returns the path of the skipped file.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn_frontmatter::warning::Warning;
    /// use std::path::{Path, PathBuf};
    ///
    /// let warning = Warning::Unreadable {
    ///     path: PathBuf::from("tasks/T-1.md"),
    ///     error: "permission denied".to_string(),
    /// };
    /// assert_eq!(warning.path(), Path::new("tasks/T-1.md"));
    /// ```
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Unreadable { path, .. } | Self::MalformedDocument { path, .. } => path,
        }
    }

    /// Returns a human-readable description of the warning.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Unreadable { path, error } => {
                format!("{}: unreadable: {}", path.display(), error)
            }
            Self::MalformedDocument { path, error } => {
                format!("{}: malformed document: {}", path.display(), error)
            }
        }
    }

    /// Returns a static string identifying the warning kind.
    ///
    /// This is useful for programmatic filtering and grouping of warnings
    /// without pattern matching on the enum variants.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unreadable { .. } => "unreadable",
            Self::MalformedDocument { .. } => "malformed_document",
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for Warning {}

/// A thread-safe collector for accumulating warnings during bulk reads.
///
/// `WarningCollector` uses interior mutability with `Arc<Mutex<...>>` so that
/// every concurrently running read can hold a clone and report into the same
/// list.
///
/// A poisoned lock is recovered rather than propagated; warnings added before
/// the panic are kept.
#[derive(Debug, Clone, Default)]
pub struct WarningCollector {
    warnings: Arc<Mutex<Vec<Warning>>>,
}

impl WarningCollector {
    /// Creates a new empty `WarningCollector`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            warnings: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Warning>> {
        self.warnings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a warning to the collector.
    pub fn add(&self, warning: Warning) {
        self.lock().push(warning);
    }

    /// Returns the number of warnings collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no warnings have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of all collected warnings.
    #[must_use]
    pub fn warnings(&self) -> Vec<Warning> {
        self.lock().clone()
    }

    /// Consumes the collector and returns all collected warnings.
    ///
    /// If this is the last reference to the underlying warning storage,
    /// the warnings are moved out directly. Otherwise, they are cloned.
    #[must_use]
    pub fn into_warnings(self) -> Vec<Warning> {
        Arc::try_unwrap(self.warnings)
            .map(|mutex| mutex.into_inner().unwrap_or_else(PoisonError::into_inner))
            .unwrap_or_else(|arc| arc.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn malformed(name: &str) -> Warning {
        Warning::MalformedDocument {
            path: PathBuf::from(name),
            error: "missing front-matter header".to_string(),
        }
    }

    #[test]
    fn description_includes_path_and_error() {
        let desc = malformed("epics/E-1.md").description();
        assert!(desc.contains("epics/E-1.md"));
        assert!(desc.contains("missing front-matter header"));
    }

    #[test]
    fn display_matches_description() {
        let warning = Warning::Unreadable {
            path: PathBuf::from("a.md"),
            error: "denied".to_string(),
        };
        assert_eq!(warning.to_string(), warning.description());
    }

    #[test]
    fn kind_enables_filtering_by_type() {
        let warnings = [
            malformed("a.md"),
            Warning::Unreadable {
                path: PathBuf::from("b.md"),
                error: "denied".to_string(),
            },
            malformed("c.md"),
        ];

        let malformed_count = warnings
            .iter()
            .filter(|w| w.kind() == "malformed_document")
            .count();
        assert_eq!(malformed_count, 2);
    }

    #[test]
    fn clone_shares_state() {
        let collector = WarningCollector::new();
        let clone = collector.clone();

        clone.add(malformed("a.md"));

        assert_eq!(collector.len(), 1);
        assert_eq!(collector.warnings()[0].path(), Path::new("a.md"));
    }

    #[test]
    fn into_warnings_with_live_clone_copies_data() {
        let collector = WarningCollector::new();
        let clone = collector.clone();
        collector.add(malformed("a.md"));

        let warnings = collector.into_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(clone.len(), 1);
    }

    #[test]
    fn collector_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WarningCollector>();
    }

    #[test]
    fn concurrent_adds() {
        let collector = WarningCollector::new();
        let mut handles = vec![];

        for i in 0..10 {
            let collector_clone = collector.clone();
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    collector_clone.add(malformed(&format!("{i}-{j}.md")));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(collector.len(), 1000);
        assert!(!collector.is_empty());
    }
}
