//! The persisted index document and its entries.

use crate::domain::{ItemId, ItemType, Links, ParentLinks, Priority, Record, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Format version of the index file. Any other version is treated as corrupt.
pub const INDEX_VERSION: u32 = 1;

/// Child lists derived from the children's parent references.
///
/// These are never read from record files. They are recomputed whenever a
/// child's linkage changes and are always sorted by ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Children {
    /// Epics in a project
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub epic_ids: Vec<ItemId>,

    /// Issues in an epic
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issue_ids: Vec<ItemId>,

    /// Tasks in an epic or issue
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub task_ids: Vec<ItemId>,

    /// Pull requests in an epic or issue
    #[serde(default, rename = "prIds", skip_serializing_if = "Vec::is_empty")]
    pub pr_ids: Vec<ItemId>,

    /// Tasks whose `parentTask` is this task
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtask_ids: Vec<ItemId>,
}

impl Children {
    /// Returns `true` if every list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all().all(|(_, ids)| ids.is_empty())
    }

    /// Every list paired with its name, for iteration.
    pub fn all(&self) -> impl Iterator<Item = (&'static str, &Vec<ItemId>)> {
        [
            ("epicIds", &self.epic_ids),
            ("issueIds", &self.issue_ids),
            ("taskIds", &self.task_ids),
            ("prIds", &self.pr_ids),
            ("subtaskIds", &self.subtask_ids),
        ]
        .into_iter()
    }
}

/// Queryable projection of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Item ID
    pub id: ItemId,

    /// Item title
    pub title: String,

    /// Record file, relative to the project root when it lies inside it
    pub path: PathBuf,

    /// Current status
    pub status: Status,

    /// Priority level
    pub priority: Priority,

    /// File modification time
    pub last_modified: DateTime<Utc>,

    /// File size in bytes
    pub size: u64,

    /// Assignee (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Free-form tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Creation timestamp from the header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Update timestamp from the header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// The record's own parent references
    #[serde(default, skip_serializing_if = "ParentLinks::is_empty")]
    pub parents: ParentLinks,

    /// Authored relations, as written in the record
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,

    /// Derived child lists
    #[serde(default, skip_serializing_if = "Children::is_empty")]
    pub children: Children,
}

impl IndexEntry {
    /// Builds the entry for a parsed record.
    ///
    /// `modified` and `size` come from the record file's metadata. The child
    /// lists start empty; the relationship graph fills them in.
    #[must_use]
    pub fn from_record(record: &Record, root: &Path, modified: SystemTime, size: u64) -> Self {
        let path = record
            .path
            .strip_prefix(root)
            .unwrap_or(&record.path)
            .to_path_buf();

        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            path,
            status: record.status,
            priority: record.priority,
            last_modified: DateTime::<Utc>::from(modified),
            size,
            assignee: record.assignee.clone(),
            tags: record.tags.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            parents: record.parents.clone(),
            links: record.links.clone(),
            children: Children::default(),
        }
    }

    /// When the item last changed: the header's `updatedAt`, else the file time.
    #[must_use]
    pub fn activity_at(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.last_modified)
    }
}

/// How the current snapshot was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildKind {
    /// Full scan of every record directory
    Rebuild,
    /// Single-record patch
    Incremental,
}

/// The most recent write to the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// Full rebuild or incremental patch
    pub kind: BuildKind,
    /// Wall time spent, in milliseconds
    pub duration_ms: u64,
    /// When it finished
    pub at: DateTime<Utc>,
}

/// Per-type entry counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCounts {
    /// Number of projects
    pub projects: usize,
    /// Number of epics
    pub epics: usize,
    /// Number of issues
    pub issues: usize,
    /// Number of tasks
    pub tasks: usize,
    /// Number of pull requests
    pub prs: usize,
}

/// Aggregates stored alongside the entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Entries per type
    pub counts: TypeCounts,
    /// Entries across all types
    pub total_items: usize,
    /// Sum of record file sizes in bytes
    pub total_size: u64,
    /// The write that produced this snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_build: Option<BuildInfo>,
}

/// The derived, queryable projection of the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    /// Format version, see [`INDEX_VERSION`]
    pub version: u32,
    /// When the snapshot was written
    pub last_updated: DateTime<Utc>,
    /// Catalog root the entries were read from
    pub project_root: PathBuf,
    /// Projects by ID
    pub projects: BTreeMap<ItemId, IndexEntry>,
    /// Epics by ID
    pub epics: BTreeMap<ItemId, IndexEntry>,
    /// Issues by ID
    pub issues: BTreeMap<ItemId, IndexEntry>,
    /// Tasks by ID
    pub tasks: BTreeMap<ItemId, IndexEntry>,
    /// Pull requests by ID
    pub prs: BTreeMap<ItemId, IndexEntry>,
    /// Aggregates
    pub stats: IndexStats,
}

impl Index {
    /// An index with no entries.
    #[must_use]
    pub fn empty(project_root: impl Into<PathBuf>, now: DateTime<Utc>) -> Self {
        Self {
            version: INDEX_VERSION,
            last_updated: now,
            project_root: project_root.into(),
            projects: BTreeMap::new(),
            epics: BTreeMap::new(),
            issues: BTreeMap::new(),
            tasks: BTreeMap::new(),
            prs: BTreeMap::new(),
            stats: IndexStats::default(),
        }
    }

    /// The entry map for one type.
    #[must_use]
    pub fn entries(&self, item_type: ItemType) -> &BTreeMap<ItemId, IndexEntry> {
        match item_type {
            ItemType::Project => &self.projects,
            ItemType::Epic => &self.epics,
            ItemType::Issue => &self.issues,
            ItemType::Task => &self.tasks,
            ItemType::Pr => &self.prs,
        }
    }

    /// Mutable entry map for one type.
    pub fn entries_mut(&mut self, item_type: ItemType) -> &mut BTreeMap<ItemId, IndexEntry> {
        match item_type {
            ItemType::Project => &mut self.projects,
            ItemType::Epic => &mut self.epics,
            ItemType::Issue => &mut self.issues,
            ItemType::Task => &mut self.tasks,
            ItemType::Pr => &mut self.prs,
        }
    }

    /// Looks up one entry.
    #[must_use]
    pub fn get(&self, item_type: ItemType, id: &ItemId) -> Option<&IndexEntry> {
        self.entries(item_type).get(id)
    }

    /// Looks up an ID in every type, parents first.
    #[must_use]
    pub fn find(&self, id: &ItemId) -> Option<(ItemType, &IndexEntry)> {
        ItemType::ALL
            .into_iter()
            .find_map(|t| self.get(t, id).map(|entry| (t, entry)))
    }

    /// Iterates over all entries, type by type, each type in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemType, &IndexEntry)> {
        ItemType::ALL
            .into_iter()
            .flat_map(move |t| self.entries(t).values().map(move |entry| (t, entry)))
    }

    /// Number of entries across all types.
    #[must_use]
    pub fn len(&self) -> usize {
        ItemType::ALL.iter().map(|t| self.entries(*t).len()).sum()
    }

    /// Returns `true` if the index has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recomputes counts and total size from the entries.
    pub fn refresh_stats(&mut self) {
        self.stats.counts = TypeCounts {
            projects: self.projects.len(),
            epics: self.epics.len(),
            issues: self.issues.len(),
            tasks: self.tasks.len(),
            prs: self.prs.len(),
        };
        self.stats.total_items = self.len();
        self.stats.total_size = self.iter().map(|(_, entry)| entry.size).sum();
    }

    /// Structural checks beyond what deserialization enforces.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self, expected_root: &Path) -> Result<(), String> {
        if self.version != INDEX_VERSION {
            return Err(format!(
                "version {} does not match supported version {INDEX_VERSION}",
                self.version
            ));
        }

        if self.project_root != expected_root {
            return Err(format!(
                "built for '{}', not '{}'",
                self.project_root.display(),
                expected_root.display()
            ));
        }

        for item_type in ItemType::ALL {
            if let Some((key, entry)) = self
                .entries(item_type)
                .iter()
                .find(|(key, entry)| **key != entry.id)
            {
                return Err(format!(
                    "{item_type} map key '{key}' holds entry '{}'",
                    entry.id
                ));
            }
        }

        Ok(())
    }
}
