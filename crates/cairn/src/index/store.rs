//! The file-backed, cached index store.
//!
//! [`IndexStore`] owns one catalog root. It keeps the last snapshot in an
//! [`IndexCache`], persists through a two-step stage/commit write, and falls
//! back to a full rebuild whenever the on-disk index is missing or fails
//! validation.
//!
//! # Load order
//!
//! 1. A cached snapshot younger than the TTL is returned as is.
//! 2. Otherwise the index file is read and hashed. If the digest matches the
//!    cached snapshot, the cache is renewed without parsing.
//! 3. A changed file is parsed and validated.
//! 4. A missing, unreadable or corrupt file triggers a rebuild.

use super::cache::{IndexCache, digest};
use super::catalog::{Catalog, LoadSource, Loaded, UpdateOutcome};
use super::graph;
use super::model::{BuildInfo, BuildKind, INDEX_VERSION, Index, IndexEntry};
use super::overview::{self, Overview};
use crate::clock::{Clock, SystemClock};
use crate::config::CatalogConfig;
use crate::domain::{ItemId, ItemType, Record, Status};
use crate::error::{Error, Result};
use crate::parser::parse_record;
use crate::scanner::{list_record_files, scan_directory};
use async_trait::async_trait;
use cairn_frontmatter::{StagedWrite, Warning};
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Counters describing how loads were served. Not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    /// Loads answered by a fresh cache
    pub hits: u64,
    /// Loads that found the cache empty or expired
    pub misses: u64,
    /// Expired loads where the file digest still matched
    pub revalidations: u64,
    /// Loads that parsed the index file
    pub disk_loads: u64,
    /// Full rebuilds from record files
    pub rebuilds: u64,
}

/// A snapshot written to the temporary file but not yet renamed into place.
///
/// Dropping it leaves the previous snapshot as the canonical file.
#[derive(Debug)]
#[must_use = "a staged snapshot is not visible until committed"]
pub struct PendingSave {
    staged: StagedWrite,
    index: Arc<Index>,
    digest: String,
}

impl PendingSave {
    /// The snapshot that will become canonical on commit.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Temporary file holding the staged bytes.
    pub fn temp_path(&self) -> &Path {
        self.staged.temp_path()
    }
}

/// File-backed [`Catalog`] rooted at one directory.
#[derive(Debug)]
pub struct IndexStore {
    root: PathBuf,
    config: CatalogConfig,
    clock: Arc<dyn Clock>,
    cache: IndexCache,
    metrics: CacheMetrics,
    last_warnings: Vec<Warning>,
}

impl IndexStore {
    /// A store over `root` using the wall clock.
    pub fn new(root: impl Into<PathBuf>, config: CatalogConfig) -> Self {
        Self::with_clock(root, config, Arc::new(SystemClock))
    }

    /// A store over `root` with an explicit time source.
    pub fn with_clock(root: impl Into<PathBuf>, config: CatalogConfig, clock: Arc<dyn Clock>) -> Self {
        let ttl = chrono::Duration::from_std(config.cache_ttl())
            .unwrap_or_else(|_| chrono::Duration::days(36_500));
        Self {
            root: root.into(),
            config,
            clock,
            cache: IndexCache::new(ttl),
            metrics: CacheMetrics::default(),
            last_warnings: Vec::new(),
        }
    }

    /// Opens the catalog at `root`, reading `.cairn/config.yaml` if present.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if `root` does not exist, or `Error::Config` if
    /// the configuration file is invalid.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = tokio::fs::canonicalize(root.as_ref()).await?;
        let config = CatalogConfig::load_for_root(&root).await?;
        Ok(Self::new(root, config))
    }

    /// Catalog root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Active configuration.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Absolute path of the index file.
    pub fn index_path(&self) -> PathBuf {
        self.config.index_path(&self.root)
    }

    /// Load counters since the store was created.
    pub fn metrics(&self) -> CacheMetrics {
        self.metrics
    }

    /// Files skipped by the most recent rebuild.
    pub fn last_warnings(&self) -> &[Warning] {
        &self.last_warnings
    }

    /// Writes `index` to the temporary file beside the index without
    /// replacing the canonical file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the temporary write fails.
    pub async fn stage_save(&mut self, mut index: Index) -> Result<PendingSave> {
        index.version = INDEX_VERSION;
        index.project_root.clone_from(&self.root);
        index.last_updated = self.clock.now();
        index.refresh_stats();

        let mut bytes = serde_json::to_vec_pretty(&index)?;
        bytes.push(b'\n');

        let path = self.index_path();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let staged = cairn_frontmatter::stage(&path, &bytes).await?;

        Ok(PendingSave {
            staged,
            index: Arc::new(index),
            digest: digest(&bytes),
        })
    }

    /// Renames a staged snapshot into place and caches it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the rename fails; the previous snapshot stays
    /// canonical.
    pub async fn commit_save(&mut self, pending: PendingSave) -> Result<Arc<Index>> {
        let PendingSave { staged, index, digest } = pending;
        staged.commit().await?;

        self.cache.store(Arc::clone(&index), digest, self.clock.now());
        tracing::info!(
            path = %self.index_path().display(),
            items = index.stats.total_items,
            "persisted index snapshot"
        );
        Ok(index)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Index> {
        let corrupt = |reason: String| Error::IndexCorruption {
            path: self.index_path(),
            reason,
        };
        let index: Index = serde_json::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?;
        index.validate(&self.root).map_err(corrupt)?;
        Ok(index)
    }

    /// Tries the cache and the index file, in that order.
    async fn load_existing(&mut self) -> Option<Loaded> {
        let now = self.clock.now();
        if let Some(index) = self.cache.fresh(now) {
            self.metrics.hits += 1;
            tracing::debug!("index served from cache");
            return Some(Loaded { index, source: LoadSource::Cache });
        }
        self.metrics.misses += 1;

        let path = self.index_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no index file");
                self.cache.invalidate();
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "index file unreadable");
                self.cache.invalidate();
                return None;
            }
        };

        let digest = digest(&bytes);
        if let Some(index) = self.cache.matching(&digest) {
            self.metrics.revalidations += 1;
            self.cache.touch(now);
            tracing::debug!("index unchanged on disk, cache renewed");
            return Some(Loaded { index, source: LoadSource::Cache });
        }

        match self.decode(&bytes) {
            Ok(index) => {
                self.metrics.disk_loads += 1;
                let index = Arc::new(index);
                self.cache.store(Arc::clone(&index), digest, now);
                tracing::debug!(items = index.len(), "index loaded from disk");
                Some(Loaded { index, source: LoadSource::Disk })
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding corrupt index");
                self.cache.invalidate();
                None
            }
        }
    }

    async fn rebuild_inner(&mut self) -> Result<Arc<Index>> {
        let started = Instant::now();
        let mut records = Vec::new();
        let mut warnings = Vec::new();

        for item_type in ItemType::ALL {
            let outcome = scan_directory(
                &self.config.type_dir(&self.root, item_type),
                item_type,
                &self.config.extension,
                self.config.scan_batch_size,
            )
            .await?;
            records.extend(outcome.records);
            warnings.extend(outcome.warnings);
        }

        // Deterministic winner when two files declare the same ID.
        records.sort_by(|a, b| (a.item_type, &a.path).cmp(&(b.item_type, &b.path)));

        let mut index = Index::empty(self.root.clone(), self.clock.now());
        for record in records {
            let Some(meta) = stat_record(&record.path).await else {
                warnings.push(Warning::Unreadable {
                    path: record.path.clone(),
                    error: "file vanished during rebuild".to_string(),
                });
                continue;
            };
            let entry = self.entry_for(&record, &meta)?;
            match index.entries_mut(record.item_type).entry(record.id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
                Entry::Occupied(existing) => {
                    tracing::warn!(
                        id = %record.id,
                        path = %record.path.display(),
                        kept = %existing.get().path.display(),
                        "duplicate id, keeping first file"
                    );
                    warnings.push(Warning::MalformedDocument {
                        path: record.path.clone(),
                        error: format!(
                            "duplicate {} id '{}', already defined in {}",
                            record.item_type,
                            record.id,
                            existing.get().path.display()
                        ),
                    });
                }
            }
        }

        graph::build_all(&mut index);
        index.stats.last_build = Some(BuildInfo {
            kind: BuildKind::Rebuild,
            duration_ms: elapsed_ms(started),
            at: self.clock.now(),
        });

        let pending = self.stage_save(index).await?;
        let index = self.commit_save(pending).await?;

        self.metrics.rebuilds += 1;
        tracing::info!(
            items = index.len(),
            skipped = warnings.len(),
            duration_ms = elapsed_ms(started),
            "rebuilt index"
        );
        self.last_warnings = warnings;
        Ok(index)
    }

    fn entry_for(&self, record: &Record, meta: &Metadata) -> Result<IndexEntry> {
        Ok(IndexEntry::from_record(record, &self.root, meta.modified()?, meta.len()))
    }

    /// Finds the file for an item: its indexed path, else the conventional
    /// one, else any file in the type directory that declares `id`.
    async fn locate(&self, index: &Index, item_type: ItemType, id: &ItemId) -> Result<Option<(PathBuf, Metadata)>> {
        let mut candidates = Vec::with_capacity(2);
        if let Some(entry) = index.get(item_type, id) {
            candidates.push(self.root.join(&entry.path));
        }
        candidates.push(self.config.record_path(&self.root, item_type, id));

        for path in candidates {
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => return Ok(Some((path, meta))),
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        let Some(path) = self.search_type_dir(item_type, id).await? else {
            return Ok(None);
        };
        tracing::debug!(%item_type, %id, path = %path.display(), "record found by directory search");
        let meta = tokio::fs::metadata(&path).await?;
        Ok(Some((path, meta)))
    }

    /// The first file by path order whose header declares `id`, matching the
    /// file a rebuild would keep.
    ///
    /// Files whose stem starts with `id` (`ISS-1-login-bug.md`) are parsed
    /// first; other files are only parsed if they sort before a hit.
    async fn search_type_dir(&self, item_type: ItemType, id: &ItemId) -> Result<Option<PathBuf>> {
        let dir = self.config.type_dir(&self.root, item_type);
        let mut paths = match list_record_files(&dir, &self.config.extension).await {
            Ok(paths) => paths,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        paths.sort();

        let (likely, rest): (Vec<PathBuf>, Vec<PathBuf>) =
            paths.into_iter().partition(|path| stem_starts_with(path, id));

        let mut found = None;
        for path in likely {
            if declares(&path, item_type, id).await {
                found = Some(path);
                break;
            }
        }
        for path in rest {
            if found.as_ref().is_some_and(|hit| path > *hit) {
                break;
            }
            if declares(&path, item_type, id).await {
                found = Some(path);
                break;
            }
        }
        Ok(found)
    }

    /// Turns the loaded snapshot into an owned index to patch.
    ///
    /// The cache's reference is released first, so the snapshot is moved
    /// rather than copied unless a caller still holds an earlier [`Loaded`].
    /// Until the patch is committed, the next load reads the file again.
    fn take_for_patch(&mut self, current: Arc<Index>) -> Index {
        self.cache.invalidate();
        Arc::unwrap_or_clone(current)
    }

    async fn persist_incremental(&mut self, mut index: Index, started: Instant) -> Result<Arc<Index>> {
        index.stats.last_build = Some(BuildInfo {
            kind: BuildKind::Incremental,
            duration_ms: elapsed_ms(started),
            at: self.clock.now(),
        });
        self.save(index).await
    }
}

fn stem_starts_with(path: &Path, id: &ItemId) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.starts_with(id.as_str()))
}

/// Unparseable files never match; a rebuild skips them too.
async fn declares(path: &Path, item_type: ItemType, id: &ItemId) -> bool {
    parse_record(path, item_type)
        .await
        .is_ok_and(|record| record.id == *id)
}

async fn stat_record(path: &Path) -> Option<Metadata> {
    tokio::fs::metadata(path).await.ok().filter(Metadata::is_file)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl Catalog for IndexStore {
    async fn load(&mut self) -> Result<Loaded> {
        if let Some(loaded) = self.load_existing().await {
            return Ok(loaded);
        }
        let index = self.rebuild_index().await?;
        Ok(Loaded { index, source: LoadSource::Rebuild })
    }

    async fn save(&mut self, index: Index) -> Result<Arc<Index>> {
        let pending = self.stage_save(index).await?;
        self.commit_save(pending).await
    }

    async fn rebuild_index(&mut self) -> Result<Arc<Index>> {
        tracing::info!(root = %self.root.display(), "rebuilding index");
        self.rebuild_inner()
            .await
            .map_err(|e| Error::Rebuild(Box::new(e)))
    }

    async fn update_item(&mut self, item_type: ItemType, id: &ItemId) -> Result<UpdateOutcome> {
        let started = Instant::now();
        let current = self.load().await?.index;

        let Some((path, meta)) = self.locate(&current, item_type, id).await? else {
            tracing::debug!(%item_type, %id, "record file missing");
            drop(current);
            return Ok(if self.remove_item(item_type, id).await? {
                UpdateOutcome::Removed
            } else {
                UpdateOutcome::Unchanged
            });
        };

        let record = parse_record(&path, item_type).await?;
        if record.id != *id {
            return Err(Error::IdMismatch {
                item_type,
                expected: id.clone(),
                found: record.id,
                path,
            });
        }

        let entry = self.entry_for(&record, &meta)?;
        if let Some(existing) = current.get(item_type, id) {
            let mut candidate = entry.clone();
            candidate.children.clone_from(&existing.children);
            if candidate == *existing {
                tracing::debug!(%item_type, %id, "entry unchanged, nothing written");
                return Ok(UpdateOutcome::Unchanged);
            }
        }

        let mut next = self.take_for_patch(current);
        graph::apply_upsert(&mut next, item_type, entry);
        self.persist_incremental(next, started).await?;
        tracing::debug!(%item_type, %id, "patched index entry");
        Ok(UpdateOutcome::Updated)
    }

    async fn remove_item(&mut self, item_type: ItemType, id: &ItemId) -> Result<bool> {
        let started = Instant::now();
        let current = self.load().await?.index;
        if current.get(item_type, id).is_none() {
            return Ok(false);
        }

        let mut next = self.take_for_patch(current);
        graph::apply_removal(&mut next, item_type, id);
        self.persist_incremental(next, started).await?;
        tracing::debug!(%item_type, %id, "removed index entry");
        Ok(true)
    }

    async fn by_type(&mut self, item_type: ItemType) -> Result<Vec<IndexEntry>> {
        let index = self.load().await?.index;
        Ok(index.entries(item_type).values().cloned().collect())
    }

    async fn by_id(
        &mut self,
        id: &ItemId,
        item_type: Option<ItemType>,
    ) -> Result<Option<(ItemType, IndexEntry)>> {
        let index = self.load().await?.index;
        // Without an explicit type, the configured ID prefix picks the type
        // to try first.
        let found = match item_type {
            Some(t) => index.get(t, id).map(|entry| (t, entry)),
            None => self
                .config
                .type_for_id(id)
                .and_then(|t| index.get(t, id).map(|entry| (t, entry)))
                .or_else(|| index.find(id)),
        };
        Ok(found.map(|(t, entry)| (t, entry.clone())))
    }

    async fn by_status(&mut self, status: Status) -> Result<Vec<(ItemType, IndexEntry)>> {
        let index = self.load().await?.index;
        Ok(index
            .iter()
            .filter(|(_, entry)| entry.status == status)
            .map(|(t, entry)| (t, entry.clone()))
            .collect())
    }

    async fn overview(&mut self) -> Result<Overview> {
        let index = self.load().await?.index;
        Ok(overview::overview(&index, self.clock.now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    async fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, content).await.unwrap();
    }

    fn store(root: &Path) -> (IndexStore, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let store = IndexStore::with_clock(root, CatalogConfig::default(), Arc::new(clock.clone()));
        (store, clock)
    }

    #[tokio::test]
    async fn first_load_rebuilds_and_writes_index() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "epics/E1.md", "---\nid: E1\ntitle: Epic\n---\n").await;
        let (mut store, _clock) = store(temp.path());

        let loaded = store.load().await.unwrap();

        assert_eq!(loaded.source, LoadSource::Rebuild);
        assert_eq!(loaded.index.len(), 1);
        assert!(store.index_path().exists());
        assert_eq!(store.metrics().rebuilds, 1);
        assert_eq!(
            loaded.index.stats.last_build.as_ref().map(|b| b.kind),
            Some(BuildKind::Rebuild)
        );
    }

    #[tokio::test]
    async fn duplicate_ids_keep_first_path_and_warn() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "issues/a.md", "---\nid: I1\ntitle: First\n---\n").await;
        write(temp.path(), "issues/b.md", "---\nid: I1\ntitle: Second\n---\n").await;
        let (mut store, _clock) = store(temp.path());

        let index = store.rebuild_index().await.unwrap();

        assert_eq!(index.issues[&ItemId::new("I1")].title, "First");
        assert_eq!(store.last_warnings().len(), 1);
        assert!(store.last_warnings()[0].description().contains("duplicate"));
    }

    #[tokio::test]
    async fn id_mismatch_is_an_error() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "issues/I1.md", "---\nid: I2\ntitle: Wrong\n---\n").await;
        let (mut store, _clock) = store(temp.path());

        let err = store
            .update_item(ItemType::Issue, &ItemId::new("I1"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::IdMismatch { found, .. } if found == ItemId::new("I2")));
    }

    #[tokio::test]
    async fn removing_unknown_item_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let (mut store, _clock) = store(temp.path());
        store.load().await.unwrap();
        let before = tokio::fs::read(store.index_path()).await.unwrap();

        assert!(!store.remove_item(ItemType::Task, &ItemId::new("T9")).await.unwrap());

        let after = tokio::fs::read(store.index_path()).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn by_id_respects_type_scope() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "issues/I1.md", "---\nid: I1\ntitle: Issue\nstatus: done\n---\n").await;
        let (mut store, _clock) = store(temp.path());

        assert!(store.by_id(&ItemId::new("I1"), None).await.unwrap().is_some());
        assert!(store
            .by_id(&ItemId::new("I1"), Some(ItemType::Epic))
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.by_status(Status::Done).await.unwrap().len(), 1);
        assert!(store.by_status(Status::Todo).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn untyped_lookup_prefers_type_named_by_prefix() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "epics/odd.md", "---\nid: ISS-7\ntitle: Epic\n---\n").await;
        write(temp.path(), "issues/ISS-7.md", "---\nid: ISS-7\ntitle: Issue\n---\n").await;
        write(temp.path(), "epics/E1.md", "---\nid: E1\ntitle: Plain\n---\n").await;
        let (mut store, _clock) = store(temp.path());

        let (t, entry) = store.by_id(&ItemId::new("ISS-7"), None).await.unwrap().unwrap();
        assert_eq!(t, ItemType::Issue);
        assert_eq!(entry.title, "Issue");

        // No prefix match: any type holding the ID.
        let (t, _) = store.by_id(&ItemId::new("E1"), None).await.unwrap().unwrap();
        assert_eq!(t, ItemType::Epic);
    }

    #[tokio::test]
    async fn unreadable_type_directory_surfaces_as_rebuild_error() {
        let temp = TempDir::new().unwrap();
        // A file where the issues directory should be cannot be listed.
        write(temp.path(), "issues", "not a directory").await;
        let (mut store, _clock) = store(temp.path());

        let err = store.load().await.unwrap_err();

        assert!(matches!(err, Error::Rebuild(_)));
    }
}
