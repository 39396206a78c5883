//! Derived parent/child adjacency.
//!
//! Children name their parents (`projectId`, `epicId`, `issueId`,
//! `parentTask`); parents never name their children in the record files.
//! This module keeps each parent's [`Children`] lists consistent with those
//! references, either from scratch ([`build_all`]) or one entry at a time
//! ([`apply_upsert`], [`apply_removal`]). Both paths produce the same lists.
//!
//! A reference to a parent that is not indexed is tolerated: the child keeps
//! its reference and no list is updated. When the parent later appears,
//! [`apply_upsert`] picks the orphan up.

use super::model::{Children, Index, IndexEntry};
use crate::domain::{ItemId, ItemType};

/// Types whose records can name `parent` as a parent.
#[must_use]
pub fn child_types(parent: ItemType) -> &'static [ItemType] {
    match parent {
        ItemType::Project => &[ItemType::Epic],
        ItemType::Epic => &[ItemType::Issue, ItemType::Task, ItemType::Pr],
        ItemType::Issue => &[ItemType::Task, ItemType::Pr],
        ItemType::Task => &[ItemType::Task],
        ItemType::Pr => &[],
    }
}

/// The list on a parent that holds children of `child_type`.
fn child_list(children: &mut Children, parent: ItemType, child_type: ItemType) -> &mut Vec<ItemId> {
    match (parent, child_type) {
        (ItemType::Task, ItemType::Task) => &mut children.subtask_ids,
        (_, ItemType::Project | ItemType::Epic) => &mut children.epic_ids,
        (_, ItemType::Issue) => &mut children.issue_ids,
        (_, ItemType::Task) => &mut children.task_ids,
        (_, ItemType::Pr) => &mut children.pr_ids,
    }
}

fn is_self_edge(child_type: ItemType, child: &ItemId, parent_type: ItemType, parent: &ItemId) -> bool {
    child_type == parent_type && child == parent
}

fn attach(index: &mut Index, parent_type: ItemType, parent: &ItemId, child_type: ItemType, child: &ItemId) {
    let Some(entry) = index.entries_mut(parent_type).get_mut(parent) else {
        tracing::debug!(%parent_type, %parent, %child, "parent not indexed, child left orphaned");
        return;
    };
    let list = child_list(&mut entry.children, parent_type, child_type);
    if let Err(pos) = list.binary_search(child) {
        list.insert(pos, child.clone());
    }
}

fn detach(index: &mut Index, parent_type: ItemType, parent: &ItemId, child_type: ItemType, child: &ItemId) {
    if let Some(entry) = index.entries_mut(parent_type).get_mut(parent) {
        child_list(&mut entry.children, parent_type, child_type).retain(|id| id != child);
    }
}

/// Recomputes every child list from the entries' parent references.
pub fn build_all(index: &mut Index) {
    for item_type in ItemType::ALL {
        for entry in index.entries_mut(item_type).values_mut() {
            entry.children = Children::default();
        }
    }

    let edges: Vec<(ItemType, ItemId, ItemType, ItemId)> = index
        .iter()
        .flat_map(|(child_type, entry)| {
            entry.parents.iter().filter_map(move |(parent_type, parent)| {
                (!is_self_edge(child_type, &entry.id, parent_type, parent))
                    .then(|| (parent_type, parent.clone(), child_type, entry.id.clone()))
            })
        })
        .collect();

    for (parent_type, parent, child_type, child) in &edges {
        attach(index, *parent_type, parent, *child_type, child);
    }
}

/// Inserts or replaces one entry and patches the affected child lists.
///
/// The incoming entry's own `children` are ignored: a replaced entry keeps
/// the lists it had, a new entry collects any already-indexed children that
/// name it. Returns the entry that was replaced, if any.
pub fn apply_upsert(index: &mut Index, item_type: ItemType, mut entry: IndexEntry) -> Option<IndexEntry> {
    let previous = index.entries_mut(item_type).remove(&entry.id);

    match &previous {
        Some(prev) => {
            entry.children = prev.children.clone();
            for (parent_type, parent) in prev.parents.iter() {
                if entry.parents.get(parent_type) != Some(parent) {
                    detach(index, parent_type, parent, item_type, &entry.id);
                }
            }
        }
        None => entry.children = collect_children(index, item_type, &entry.id),
    }

    let parents: Vec<(ItemType, ItemId)> = entry
        .parents
        .iter()
        .filter(|(parent_type, parent)| !is_self_edge(item_type, &entry.id, *parent_type, parent))
        .map(|(parent_type, parent)| (parent_type, parent.clone()))
        .collect();
    let id = entry.id.clone();
    index.entries_mut(item_type).insert(id.clone(), entry);

    for (parent_type, parent) in &parents {
        attach(index, *parent_type, parent, item_type, &id);
    }

    previous
}

/// Removes one entry and strips it from its parents' child lists.
///
/// Children of the removed entry are left untouched; their parent reference
/// now dangles.
pub fn apply_removal(index: &mut Index, item_type: ItemType, id: &ItemId) -> Option<IndexEntry> {
    let removed = index.entries_mut(item_type).remove(id)?;
    for (parent_type, parent) in removed.parents.iter() {
        detach(index, parent_type, parent, item_type, id);
    }
    Some(removed)
}

/// Builds the child lists for a parent that is not indexed yet.
fn collect_children(index: &Index, parent_type: ItemType, parent: &ItemId) -> Children {
    let mut children = Children::default();
    for &child_type in child_types(parent_type) {
        for child in index.entries(child_type).values() {
            if child.parents.get(parent_type) == Some(parent)
                && !is_self_edge(child_type, &child.id, parent_type, parent)
            {
                child_list(&mut children, parent_type, child_type).push(child.id.clone());
            }
        }
    }
    // BTreeMap iteration is already in ID order, one list per child type.
    children
}
