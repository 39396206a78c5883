//! The read/write contract consumers program against.

use super::model::{Index, IndexEntry};
use super::overview::Overview;
use crate::domain::{ItemId, ItemType, Status};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Where a loaded index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadSource {
    /// The in-process cache, either still fresh or revalidated by digest
    Cache,
    /// Parsed from the on-disk index file
    Disk,
    /// Rebuilt from the record files
    Rebuild,
}

/// A loaded index snapshot.
#[derive(Debug, Clone)]
pub struct Loaded {
    /// The snapshot; shared with the cache
    pub index: Arc<Index>,
    /// How it was obtained
    pub source: LoadSource,
}

/// Result of re-indexing a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOutcome {
    /// The entry changed and a new snapshot was persisted
    Updated,
    /// The entry already matched the file; nothing was written
    Unchanged,
    /// The record file is gone and its entry was removed
    Removed,
}

/// Durable, cached access to the catalog index.
///
/// Every read goes through [`load`](Catalog::load), so the returned data is
/// never older than the cache TTL. Writes replace the on-disk index
/// atomically and refresh the cache.
///
/// # Method Categories
///
/// - **Persistence**: `load`, `save`, `rebuild_index`
/// - **Incremental maintenance**: `update_item`, `remove_item`
/// - **Queries**: `by_type`, `by_id`, `by_status`, `overview`
#[async_trait]
pub trait Catalog: Send + Sync {
    // ========== Persistence ==========

    /// Returns the current index, from cache, disk, or a rebuild.
    ///
    /// A missing or corrupt index file is never an error; it triggers a
    /// rebuild.
    ///
    /// # Errors
    ///
    /// Returns `Error::Rebuild` if the fallback rebuild fails.
    async fn load(&mut self) -> Result<Loaded>;

    /// Persists `index` as the new snapshot and caches it.
    ///
    /// Stats, `lastUpdated` and the project root are recomputed before
    /// writing.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` or `Error::Serialization` if the write fails. The
    /// previous snapshot is left intact in that case.
    async fn save(&mut self, index: Index) -> Result<Arc<Index>>;

    /// Scans every record directory and replaces the index.
    ///
    /// # Errors
    ///
    /// Returns `Error::Rebuild` wrapping the underlying cause.
    async fn rebuild_index(&mut self) -> Result<Arc<Index>>;

    // ========== Incremental maintenance ==========

    /// Re-reads one record file and patches the index.
    ///
    /// A record whose file no longer exists is removed.
    ///
    /// # Errors
    ///
    /// - `Error::Parse` if the file is malformed
    /// - `Error::IdMismatch` if the file declares a different ID
    async fn update_item(&mut self, item_type: ItemType, id: &ItemId) -> Result<UpdateOutcome>;

    /// Removes one entry and prunes references to it.
    ///
    /// Returns `false`, without writing, if the entry was not indexed.
    async fn remove_item(&mut self, item_type: ItemType, id: &ItemId) -> Result<bool>;

    // ========== Queries ==========

    /// All entries of one type, in ID order.
    async fn by_type(&mut self, item_type: ItemType) -> Result<Vec<IndexEntry>>;

    /// Looks up one entry, optionally restricted to a type.
    async fn by_id(
        &mut self,
        id: &ItemId,
        item_type: Option<ItemType>,
    ) -> Result<Option<(ItemType, IndexEntry)>>;

    /// All entries with the given status, across types.
    async fn by_status(&mut self, status: Status) -> Result<Vec<(ItemType, IndexEntry)>>;

    /// Catalog-wide statistics.
    async fn overview(&mut self) -> Result<Overview>;
}
