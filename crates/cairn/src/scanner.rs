//! Directory scanning.
//!
//! Lists every record file of one type and parses them with bounded
//! concurrency. At most `batch_size` files are open at once; each batch is
//! awaited before the next one starts. A file that cannot be read or parsed
//! is logged, reported as a [`Warning`], and skipped; it never aborts the
//! scan.
//!
//! The order of [`ScanOutcome::records`] is unspecified. Callers that need
//! an order sort explicitly.

use crate::domain::{ItemType, Record};
use crate::error::{Error, Result};
use crate::parser::parse_record;
use cairn_frontmatter::{Warning, WarningCollector};
use futures::future::join_all;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Records found in one directory, plus the files that were skipped.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Successfully parsed records
    pub records: Vec<Record>,
    /// One warning per skipped file
    pub warnings: Vec<Warning>,
}

/// Scans `dir` for records of `item_type`.
///
/// Only regular, non-hidden files whose extension equals `extension` are
/// considered. A directory that does not exist holds no items and yields an
/// empty outcome.
///
/// # Errors
///
/// Returns [`Error::Io`] only if `dir` exists but cannot be listed.
/// Per-file failures are reported through [`ScanOutcome::warnings`].
pub async fn scan_directory(
    dir: &Path,
    item_type: ItemType,
    extension: &str,
    batch_size: usize,
) -> Result<ScanOutcome> {
    let paths = match list_record_files(dir, extension).await {
        Ok(paths) => paths,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(dir = %dir.display(), %item_type, "directory absent, no items");
            return Ok(ScanOutcome::default());
        }
        Err(e) => return Err(e.into()),
    };

    let collector = WarningCollector::new();
    let mut records = Vec::with_capacity(paths.len());

    for batch in paths.chunks(batch_size.max(1)) {
        let parsed = join_all(batch.iter().map(|path| {
            let collector = collector.clone();
            async move { parse_or_warn(path, item_type, &collector).await }
        }))
        .await;
        records.extend(parsed.into_iter().flatten());
    }

    let warnings = collector.into_warnings();
    tracing::debug!(
        dir = %dir.display(),
        %item_type,
        parsed = records.len(),
        skipped = warnings.len(),
        "scanned directory"
    );

    Ok(ScanOutcome { records, warnings })
}

async fn parse_or_warn(
    path: &Path,
    item_type: ItemType,
    collector: &WarningCollector,
) -> Option<Record> {
    match parse_record(path, item_type).await {
        Ok(record) => Some(record),
        Err(Error::Parse(e)) => {
            tracing::warn!(path = %path.display(), reason = %e.reason, "skipping malformed record");
            collector.add(Warning::MalformedDocument {
                path: path.to_path_buf(),
                error: e.reason,
            });
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
            collector.add(Warning::Unreadable {
                path: path.to_path_buf(),
                error: e.to_string(),
            });
            None
        }
    }
}

/// Lists candidate record files in `dir` (not recursive).
pub(crate) async fn list_record_files(dir: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut paths = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !has_extension(&path, extension) {
            continue;
        }
        // file_type() does not follow symlinks; metadata() does.
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "cannot stat entry"),
        }
    }

    Ok(paths)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
