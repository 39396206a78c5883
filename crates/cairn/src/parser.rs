//! Record file parsing.
//!
//! A record is a front-matter document: a YAML header with the item's
//! metadata, then a free-form body. Known header keys are parsed into typed
//! fields; anything else is kept verbatim in [`Record::extra`] so that newer
//! files remain readable by older builds.
//!
//! ```text
//! ---
//! id: TASK-7
//! title: Add retry to the uploader
//! status: in-progress
//! priority: high
//! issueId: ISS-3
//! epicId: EPIC-1
//! blockedBy: [TASK-6]
//! createdAt: 2024-05-01T09:00:00Z
//! ---
//! Details...
//! ```

use crate::domain::{ItemId, ItemType, Links, ParentLinks, Priority, Record, Status};
use crate::error::{Error, ParseError, Result};
use cairn_frontmatter::parse_document;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;

/// Header as written on disk. Converted into a [`Record`] after validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordHeader {
    id: ItemId,
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    status: Status,
    #[serde(default, deserialize_with = "null_as_default")]
    priority: Priority,
    #[serde(default)]
    assignee: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    tags: Vec<String>,
    #[serde(default, alias = "created", deserialize_with = "flexible_timestamp")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated", deserialize_with = "flexible_timestamp")]
    updated_at: Option<DateTime<Utc>>,

    #[serde(default, alias = "project")]
    project_id: Option<ItemId>,
    #[serde(default, alias = "epic")]
    epic_id: Option<ItemId>,
    #[serde(default, alias = "issue")]
    issue_id: Option<ItemId>,
    #[serde(default)]
    parent_task: Option<ItemId>,

    #[serde(default, deserialize_with = "null_as_default")]
    subtasks: Vec<ItemId>,
    #[serde(default, deserialize_with = "null_as_default")]
    related_issues: Vec<ItemId>,
    #[serde(default, deserialize_with = "null_as_default")]
    related_tasks: Vec<ItemId>,
    #[serde(default, rename = "relatedPRs", deserialize_with = "null_as_default")]
    related_prs: Vec<ItemId>,
    #[serde(default, deserialize_with = "null_as_default")]
    blocked_by: Vec<ItemId>,
    #[serde(default, deserialize_with = "null_as_default")]
    blocks: Vec<ItemId>,
    #[serde(default, deserialize_with = "null_as_default")]
    dependencies: Vec<ItemId>,

    #[serde(flatten)]
    extra: BTreeMap<String, serde_yaml::Value>,
}

/// Treats an explicit `null` (e.g. `tags:` with no value) like an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
fn flexible_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Some(dt.and_utc()))
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

/// Reads and parses one record file.
///
/// # Errors
///
/// - [`Error::Io`] if the file cannot be read
/// - [`Error::Parse`] if its content is not a valid record of `item_type`
pub async fn parse_record(path: &Path, item_type: ItemType) -> Result<Record> {
    let text = tokio::fs::read_to_string(path).await?;
    parse_record_text(&text, path, item_type).map_err(Error::from)
}

/// Parses record text that was read from `path`.
///
/// Pure: `path` is only recorded in the result and in errors.
///
/// # Errors
///
/// Returns a [`ParseError`] if the header is missing or malformed, if `id`
/// or `title` is absent or blank, or if a task or pull request has no
/// `issueId`.
pub fn parse_record_text(
    text: &str,
    path: &Path,
    item_type: ItemType,
) -> std::result::Result<Record, ParseError> {
    let document = parse_document::<RecordHeader>(text)
        .map_err(|e| ParseError::new(path, e.to_string()))?;
    let header = document.header;

    let id = ItemId::new(header.id.as_str().trim());
    if id.as_str().is_empty() {
        return Err(ParseError::new(path, "id must not be blank"));
    }
    let title = header.title.trim().to_string();
    if title.is_empty() {
        return Err(ParseError::new(path, "title must not be blank"));
    }

    let mut extra = header.extra;
    let parents = applicable_parents(
        item_type,
        ParentLinks {
            project_id: non_blank(header.project_id),
            epic_id: non_blank(header.epic_id),
            issue_id: non_blank(header.issue_id),
            parent_task: non_blank(header.parent_task),
        },
        &mut extra,
    );

    if matches!(item_type, ItemType::Task | ItemType::Pr) && parents.issue_id.is_none() {
        return Err(ParseError::new(
            path,
            format!("{item_type} '{id}' is missing required field issueId"),
        ));
    }

    Ok(Record {
        item_type,
        id,
        title,
        status: header.status,
        priority: header.priority,
        assignee: header
            .assignee
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty()),
        tags: header.tags,
        created_at: header.created_at,
        updated_at: header.updated_at,
        parents,
        links: Links {
            subtasks: header.subtasks,
            related_issues: header.related_issues,
            related_tasks: header.related_tasks,
            related_prs: header.related_prs,
            blocked_by: header.blocked_by,
            blocks: header.blocks,
            dependencies: header.dependencies,
        },
        extra,
        body: document.body,
        path: path.to_path_buf(),
    })
}

fn non_blank(id: Option<ItemId>) -> Option<ItemId> {
    id.map(|id| ItemId::new(id.as_str().trim()))
        .filter(|id| !id.as_str().is_empty())
}

/// Keeps only the parent references `item_type` may carry.
///
/// A reference the type cannot carry (a project with an `epicId`) is not an
/// error; it is moved to `extra` untouched and plays no part in the graph.
fn applicable_parents(
    item_type: ItemType,
    parents: ParentLinks,
    extra: &mut BTreeMap<String, serde_yaml::Value>,
) -> ParentLinks {
    let (project, epic, issue, parent_task) = match item_type {
        ItemType::Project => (false, false, false, false),
        ItemType::Epic => (true, false, false, false),
        ItemType::Issue => (false, true, false, false),
        ItemType::Task => (false, true, true, true),
        ItemType::Pr => (false, true, true, false),
    };

    let mut keep = |allowed: bool, key: &str, value: Option<ItemId>| {
        if allowed {
            return value;
        }
        if let Some(value) = value {
            tracing::debug!(%item_type, key, "ignoring parent reference not valid for this type");
            extra.insert(key.to_string(), serde_yaml::Value::String(value.0));
        }
        None
    };

    ParentLinks {
        project_id: keep(project, "projectId", parents.project_id),
        epic_id: keep(epic, "epicId", parents.epic_id),
        issue_id: keep(issue, "issueId", parents.issue_id),
        parent_task: keep(parent_task, "parentTask", parents.parent_task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn parse(text: &str, item_type: ItemType) -> std::result::Result<Record, ParseError> {
        parse_record_text(text, Path::new("records/item.md"), item_type)
    }

    #[test]
    fn parses_full_task_header() {
        let text = "---
id: TASK-7
title: Add retry to the uploader
status: in-progress
priority: high
assignee: dana
tags: [backend, net]
issueId: ISS-3
epicId: EPIC-1
parentTask: TASK-2
blockedBy: [TASK-6]
relatedPRs: [PR-9]
createdAt: 2024-05-01T09:00:00Z
updatedAt: 2024-05-02
---
Details here.
";
        let record = parse(text, ItemType::Task).unwrap();

        assert_eq!(record.id, ItemId::new("TASK-7"));
        assert_eq!(record.status, Status::InProgress);
        assert_eq!(record.priority, Priority::High);
        assert_eq!(record.assignee.as_deref(), Some("dana"));
        assert_eq!(record.tags, vec!["backend", "net"]);
        assert_eq!(record.parents.issue_id, Some(ItemId::new("ISS-3")));
        assert_eq!(record.parents.epic_id, Some(ItemId::new("EPIC-1")));
        assert_eq!(record.parents.parent_task, Some(ItemId::new("TASK-2")));
        assert_eq!(record.links.blocked_by, vec![ItemId::new("TASK-6")]);
        assert_eq!(record.links.related_prs, vec![ItemId::new("PR-9")]);
        assert_eq!(
            record.created_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap())
        );
        assert_eq!(
            record.updated_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(record.body, "Details here.\n");
    }

    #[test]
    fn defaults_apply_to_minimal_header() {
        let record = parse("---\nid: ISS-1\ntitle: Minimal\n---\n", ItemType::Issue).unwrap();

        assert_eq!(record.status, Status::Todo);
        assert_eq!(record.priority, Priority::Medium);
        assert!(record.assignee.is_none());
        assert!(record.tags.is_empty());
        assert!(record.links.is_empty());
        assert_eq!(record.parents, ParentLinks::default());
    }

    #[test]
    fn issue_without_epic_is_valid() {
        let record = parse("---\nid: ISS-2\ntitle: Orphan\n---\n", ItemType::Issue).unwrap();
        assert!(record.parents.epic_id.is_none());
    }

    #[test]
    fn aliases_and_nulls_are_accepted() {
        let text = "---\nid: ISS-4\ntitle: Aliased\nepic: EPIC-2\ntags:\nassignee: ''\nstatus: closed\n---\n";
        let record = parse(text, ItemType::Issue).unwrap();

        assert_eq!(record.parents.epic_id, Some(ItemId::new("EPIC-2")));
        assert!(record.tags.is_empty());
        assert!(record.assignee.is_none());
        assert_eq!(record.status, Status::Done);
    }

    #[test]
    fn unknown_keys_are_preserved() {
        let text = "---\nid: ISS-5\ntitle: Synced\ngithub:\n  number: 12\n  url: https://example.test/12\n---\n";
        let record = parse(text, ItemType::Issue).unwrap();

        let github = record.extra.get("github").expect("github key kept");
        assert_eq!(github["number"].as_u64(), Some(12));
    }

    #[test]
    fn inapplicable_parent_moves_to_extra() {
        let text = "---\nid: PRJ-1\ntitle: Project\nepicId: EPIC-1\n---\n";
        let record = parse(text, ItemType::Project).unwrap();

        assert!(record.parents.epic_id.is_none());
        assert_eq!(
            record.extra.get("epicId").and_then(serde_yaml::Value::as_str),
            Some("EPIC-1")
        );
    }

    #[rstest]
    #[case::task(ItemType::Task)]
    #[case::pr(ItemType::Pr)]
    fn task_and_pr_require_issue(#[case] item_type: ItemType) {
        let err = parse("---\nid: X-1\ntitle: No parent\n---\n", item_type).unwrap_err();
        assert!(err.reason.contains("issueId"));
    }

    #[rstest]
    #[case::no_header("id: ISS-1\ntitle: T\n")]
    #[case::unterminated("---\nid: ISS-1\ntitle: T\n")]
    #[case::missing_id("---\ntitle: T\n---\n")]
    #[case::missing_title("---\nid: ISS-1\n---\n")]
    #[case::blank_id("---\nid: '  '\ntitle: T\n---\n")]
    #[case::blank_title("---\nid: ISS-1\ntitle: ''\n---\n")]
    #[case::bad_status("---\nid: ISS-1\ntitle: T\nstatus: someday\n---\n")]
    #[case::bad_date("---\nid: ISS-1\ntitle: T\ncreatedAt: yesterday\n---\n")]
    #[case::not_a_map("---\n- a\n- b\n---\n")]
    fn malformed_records_fail(#[case] text: &str) {
        let err = parse(text, ItemType::Issue).unwrap_err();
        assert_eq!(err.path, Path::new("records/item.md"));
    }

    #[tokio::test]
    async fn parse_record_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EPIC-1.md");
        tokio::fs::write(&path, "---\nid: EPIC-1\ntitle: Auth\nprojectId: PRJ-1\n---\nbody")
            .await
            .unwrap();

        let record = parse_record(&path, ItemType::Epic).await.unwrap();
        assert_eq!(record.parents.project_id, Some(ItemId::new("PRJ-1")));
        assert_eq!(record.path, path);
    }

    #[tokio::test]
    async fn parse_record_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = parse_record(&dir.path().join("nope.md"), ItemType::Epic).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
