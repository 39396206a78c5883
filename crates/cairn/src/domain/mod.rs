//! Domain types for the work item catalog.
//!
//! The catalog is a hierarchy of five item types:
//! Project → Epic → Issue → Task → Pull request. Every item is stored as its
//! own front-matter record file; linkage is expressed by children naming
//! their parent (an Issue carries its `epicId`), never by parents listing
//! their children.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Unique identifier for an item within its type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Create a new item ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The five kinds of work item, ordered from the top of the hierarchy down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Top-level project
    Project,

    /// Large body of work inside a project
    Epic,

    /// Unit of planned work, optionally inside an epic
    Issue,

    /// Concrete step toward an issue
    Task,

    /// Pull request implementing an issue
    Pr,
}

impl ItemType {
    /// All item types, parents before children.
    pub const ALL: [ItemType; 5] = [
        ItemType::Project,
        ItemType::Epic,
        ItemType::Issue,
        ItemType::Task,
        ItemType::Pr,
    ];

    /// The lowercase name used in commands and file headers.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Project => "project",
            ItemType::Epic => "epic",
            ItemType::Issue => "issue",
            ItemType::Task => "task",
            ItemType::Pr => "pr",
        }
    }

    /// Default subdirectory holding records of this type.
    #[must_use]
    pub fn default_dir(self) -> &'static str {
        match self {
            ItemType::Project => "projects",
            ItemType::Epic => "epics",
            ItemType::Issue => "issues",
            ItemType::Task => "tasks",
            ItemType::Pr => "prs",
        }
    }

    /// Default ID prefix for records of this type.
    #[must_use]
    pub fn default_prefix(self) -> &'static str {
        match self {
            ItemType::Project => "PRJ",
            ItemType::Epic => "EPIC",
            ItemType::Issue => "ISS",
            ItemType::Task => "TASK",
            ItemType::Pr => "PR",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "project" | "projects" => Ok(ItemType::Project),
            "epic" | "epics" => Ok(ItemType::Epic),
            "issue" | "issues" => Ok(ItemType::Issue),
            "task" | "tasks" => Ok(ItemType::Task),
            "pr" | "prs" | "pull-request" | "pullrequest" => Ok(ItemType::Pr),
            other => Err(format!("unknown item type '{other}'")),
        }
    }
}

/// A typed reference to an indexed item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    /// Type of the referenced item
    pub item_type: ItemType,
    /// ID of the referenced item
    pub id: ItemId,
}

impl ItemRef {
    /// Create a reference
    pub fn new(item_type: ItemType, id: impl Into<ItemId>) -> Self {
        Self {
            item_type,
            id: id.into(),
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.item_type, self.id)
    }
}

/// Workflow status of an item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Not started
    #[default]
    #[serde(alias = "open", alias = "planning")]
    Todo,

    /// Being worked on
    #[serde(alias = "in_progress")]
    InProgress,

    /// Waiting for review
    #[serde(alias = "review", alias = "in_review")]
    InReview,

    /// Cannot proceed
    Blocked,

    /// Finished
    #[serde(alias = "completed", alias = "closed", alias = "merged")]
    Done,

    /// Abandoned
    #[serde(alias = "canceled")]
    Cancelled,
}

impl Status {
    /// All statuses in workflow order.
    pub const ALL: [Status; 6] = [
        Status::Todo,
        Status::InProgress,
        Status::InReview,
        Status::Blocked,
        Status::Done,
        Status::Cancelled,
    ];

    /// The canonical kebab-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in-progress",
            Status::InReview => "in-review",
            Status::Blocked => "blocked",
            Status::Done => "done",
            Status::Cancelled => "cancelled",
        }
    }

    /// Whether no further work is expected on the item.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Status::Done | Status::Cancelled)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_yaml::from_str(s.trim()).map_err(|_| format!("unknown status '{}'", s.trim()))
    }
}

/// Priority level of an item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Drop everything
    Critical,

    /// Next up
    High,

    /// Normal
    #[default]
    Medium,

    /// Whenever there is time
    Low,
}

impl Priority {
    /// All priorities from most to least urgent.
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    /// The canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authored relations between items.
///
/// These are copied verbatim from the record header. Unlike the derived
/// child lists in the index they are owned by the record that declares them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Links {
    /// Child tasks declared by a task
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<ItemId>,

    /// Related issues
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_issues: Vec<ItemId>,

    /// Related tasks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_tasks: Vec<ItemId>,

    /// Related pull requests
    #[serde(default, rename = "relatedPRs", skip_serializing_if = "Vec::is_empty")]
    pub related_prs: Vec<ItemId>,

    /// Items that must finish before this one can proceed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<ItemId>,

    /// Items this one is holding up
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<ItemId>,

    /// Items this one depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ItemId>,
}

impl Links {
    /// Returns `true` if no relation is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Iterates over every declared relation as `(relation name, target)`.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ItemId)> {
        let lists: [(&'static str, &Vec<ItemId>); 7] = [
            ("subtasks", &self.subtasks),
            ("relatedIssues", &self.related_issues),
            ("relatedTasks", &self.related_tasks),
            ("relatedPRs", &self.related_prs),
            ("blockedBy", &self.blocked_by),
            ("blocks", &self.blocks),
            ("dependencies", &self.dependencies),
        ];
        lists
            .into_iter()
            .flat_map(|(name, ids)| ids.iter().map(move |id| (name, id)))
    }

    /// Targets this item has to wait for (`blockedBy` and `dependencies`).
    pub fn prerequisites(&self) -> impl Iterator<Item = &ItemId> {
        self.blocked_by.iter().chain(self.dependencies.iter())
    }
}

/// Parent references carried by a record.
///
/// Every field is optional at this level; which ones a type may carry, and
/// which are mandatory, is enforced by the record parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentLinks {
    /// Owning project (epics)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ItemId>,

    /// Owning epic (issues, tasks, pull requests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<ItemId>,

    /// Owning issue (tasks and pull requests, required for both)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<ItemId>,

    /// Parent task (tasks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task: Option<ItemId>,
}

impl ParentLinks {
    /// Returns `true` if no parent is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Iterates over the parents that are set, paired with the parent's type.
    pub fn iter(&self) -> impl Iterator<Item = (ItemType, &ItemId)> {
        [
            (ItemType::Project, self.project_id.as_ref()),
            (ItemType::Epic, self.epic_id.as_ref()),
            (ItemType::Issue, self.issue_id.as_ref()),
            (ItemType::Task, self.parent_task.as_ref()),
        ]
        .into_iter()
        .filter_map(|(item_type, id)| id.map(|id| (item_type, id)))
    }

    /// The parent of the given type, if set.
    #[must_use]
    pub fn get(&self, parent_type: ItemType) -> Option<&ItemId> {
        match parent_type {
            ItemType::Project => self.project_id.as_ref(),
            ItemType::Epic => self.epic_id.as_ref(),
            ItemType::Issue => self.issue_id.as_ref(),
            ItemType::Task => self.parent_task.as_ref(),
            ItemType::Pr => None,
        }
    }
}

/// One persisted work item.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Which kind of item this is
    pub item_type: ItemType,

    /// Unique identifier within the item type
    pub id: ItemId,

    /// Item title
    pub title: String,

    /// Current status
    pub status: Status,

    /// Priority level
    pub priority: Priority,

    /// Assignee (optional)
    pub assignee: Option<String>,

    /// Free-form tags
    pub tags: Vec<String>,

    /// Creation timestamp
    pub created_at: Option<DateTime<Utc>>,

    /// Last update timestamp as recorded in the header
    pub updated_at: Option<DateTime<Utc>>,

    /// Parent references
    pub parents: ParentLinks,

    /// Authored relations
    pub links: Links,

    /// Header keys this version does not know about, kept verbatim
    pub extra: BTreeMap<String, serde_yaml::Value>,

    /// Everything after the header
    pub body: String,

    /// File the record was read from
    pub path: PathBuf,
}
