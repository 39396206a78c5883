//! Atomic file replacement.
//!
//! This module provides crash-safe replacement of whole files using the
//! temp-file-then-rename pattern.
//!
//! # Atomicity Guarantee
//!
//! On POSIX systems, file renames within the same filesystem are atomic operations.
//! This module exploits this property to provide crash-safe writes:
//!
//! 1. Data is first written to a temporary file with a `.tmp` extension beside the target
//! 2. The temporary file is flushed and synced to disk
//! 3. The temporary file is atomically renamed to the target path
//!
//! If a crash occurs during step 1 or 2, the original file remains intact.
//! The temporary file may be left behind, but data integrity is preserved.
//!
//! The two halves are exposed separately as [`StagedWrite`] so that callers can
//! reason about (and tests can simulate) a crash between staging and commit.
//!
//! # Examples
//!
//! ```no_run
//! use cairn_frontmatter::atomic::write_json_atomic;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Snapshot {
//!     version: u32,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! write_json_atomic("index.json", &Snapshot { version: 1 }).await?;
//! # Ok(())
//! # }
//! ```

use crate::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// A fully written temporary file that has not yet replaced its target.
///
/// Dropping a `StagedWrite` without calling [`commit`](Self::commit) leaves
/// the target untouched and the temporary file on disk, exactly as a crash
/// at that point would. Use [`abandon`](Self::abandon) to clean up instead.
#[derive(Debug)]
#[must_use = "a staged write does nothing until it is committed"]
pub struct StagedWrite {
    temp_path: PathBuf,
    target: PathBuf,
}

impl StagedWrite {
    /// Path of the temporary file holding the staged content.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Path that will be replaced on commit.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Atomically renames the staged file over the target.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails (e.g., cross-filesystem move).
    /// The target is unchanged in that case.
    pub async fn commit(self) -> Result<()> {
        tokio::fs::rename(&self.temp_path, &self.target).await?;
        Ok(())
    }

    /// Removes the staged file without touching the target.
    pub async fn abandon(self) {
        // Best-effort cleanup of temp file
        let _ = tokio::fs::remove_file(&self.temp_path).await;
    }
}

/// Writes `contents` to the temporary path beside `path` without replacing it.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, written or
/// synced. A partially written temporary file is removed on failure.
pub async fn stage<P: AsRef<Path>>(path: P, contents: &[u8]) -> Result<StagedWrite> {
    let target = path.as_ref().to_path_buf();
    let temp_path = make_temp_path(&target);

    if let Err(e) = write_to_temp_file(&temp_path, contents).await {
        // Best-effort cleanup of temp file
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    Ok(StagedWrite { temp_path, target })
}

/// Atomically replaces the file at `path` with `contents`.
///
/// # Errors
///
/// Returns an error if staging or the final rename fails. On failure, the
/// original file (if it exists) is left unchanged.
pub async fn write_atomic<P: AsRef<Path>>(path: P, contents: &[u8]) -> Result<()> {
    stage(path, contents).await?.commit().await
}

/// Serializes `value` as pretty-printed JSON and atomically replaces `path`.
///
/// The output ends with a newline. Serialization happens before any file is
/// touched, so a serialization failure never leaves a temporary file behind.
///
/// # Errors
///
/// Returns an error if serialization fails or the write fails.
pub async fn write_json_atomic<T, P>(path: P, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    write_atomic(path, &bytes).await
}

/// Creates a temporary file path for atomic write operations.
///
/// The temp path is created by appending `.tmp` to the original filename.
/// If the original path has no extension, `.tmp` is appended directly.
/// If it has an extension, the extension is replaced with `{ext}.tmp`.
#[must_use]
pub fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

/// Writes bytes to a temporary file, ensuring proper flush and sync.
async fn write_to_temp_file(temp_path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = File::create(temp_path).await?;
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}
