//! Catalog-wide statistics.

use super::model::Index;
use crate::domain::{ItemId, ItemType, Priority, Status};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Width of the recent-activity window, in days.
pub const RECENT_ACTIVITY_DAYS: i64 = 7;

/// Item counts for one type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    /// Items of this type
    pub total: usize,
    /// Items of this type with status `done`
    pub completed: usize,
}

/// One item touched inside the activity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Type of the item
    pub item_type: ItemType,
    /// Item ID
    pub id: ItemId,
    /// Item title
    pub title: String,
    /// Current status
    pub status: Status,
    /// `updatedAt`, else the file modification time
    pub at: DateTime<Utc>,
}

/// Summary of the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// Items across all types
    pub total_items: usize,
    /// Totals per type; every type is present
    pub by_type: BTreeMap<ItemType, TypeSummary>,
    /// Items per status; every status is present
    pub by_status: BTreeMap<Status, usize>,
    /// Items per priority; every priority is present
    pub by_priority: BTreeMap<Priority, usize>,
    /// Percentage of items that are done, `0.0` for an empty catalog
    pub completion_rate: f64,
    /// Items active within [`RECENT_ACTIVITY_DAYS`] of `now`, newest first.
    /// Timestamps after `now` count as recent.
    pub recent_activity: Vec<Activity>,
}

/// Computes the overview of `index` as seen at `now`.
///
/// Recent activity keeps every item whose activity time is no older than
/// [`RECENT_ACTIVITY_DAYS`] before `now`. An `updatedAt` ahead of `now`
/// (clock skew, hand edits) is kept and sorts first.
#[must_use]
pub fn overview(index: &Index, now: DateTime<Utc>) -> Overview {
    let mut by_type: BTreeMap<ItemType, TypeSummary> = ItemType::ALL
        .into_iter()
        .map(|t| (t, TypeSummary::default()))
        .collect();
    let mut by_status: BTreeMap<Status, usize> = Status::ALL.into_iter().map(|s| (s, 0)).collect();
    let mut by_priority: BTreeMap<Priority, usize> =
        Priority::ALL.into_iter().map(|p| (p, 0)).collect();

    let window_start = now - Duration::days(RECENT_ACTIVITY_DAYS);
    let mut recent_activity = Vec::new();
    let mut total_items = 0;
    let mut done = 0;

    for (item_type, entry) in index.iter() {
        total_items += 1;
        let summary = by_type.entry(item_type).or_default();
        summary.total += 1;
        if entry.status == Status::Done {
            summary.completed += 1;
            done += 1;
        }
        *by_status.entry(entry.status).or_default() += 1;
        *by_priority.entry(entry.priority).or_default() += 1;

        let at = entry.activity_at();
        if at >= window_start {
            recent_activity.push(Activity {
                item_type,
                id: entry.id.clone(),
                title: entry.title.clone(),
                status: entry.status,
                at,
            });
        }
    }

    recent_activity.sort_by(|a, b| b.at.cmp(&a.at).then_with(|| a.id.cmp(&b.id)));

    #[allow(clippy::cast_precision_loss)]
    let completion_rate = if total_items == 0 {
        0.0
    } else {
        done as f64 / total_items as f64 * 100.0
    };

    Overview {
        total_items,
        by_type,
        by_status,
        by_priority,
        completion_rate,
        recent_activity,
    }
}
