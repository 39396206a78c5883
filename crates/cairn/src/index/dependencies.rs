//! Dependency analysis over authored relations, using petgraph.
//!
//! Edges point from the waiting item to its prerequisite, taken from
//! `blockedBy` and `dependencies`. Relation targets are bare IDs; they are
//! resolved against the index with [`Index::find`]. Targets that are not
//! indexed contribute no edge and show up in [`dangling_links`] instead.

use super::model::Index;
use crate::domain::{ItemId, ItemRef, ItemType};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// An item waiting on unfinished prerequisites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedItem {
    /// The waiting item
    pub item: ItemRef,
    /// Its unfinished, indexed prerequisites, sorted
    pub blockers: Vec<ItemRef>,
}

/// A reference to an ID that is not indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingLink {
    /// Item holding the reference
    pub from: ItemRef,
    /// Header field the reference appears in
    pub relation: &'static str,
    /// The unresolved ID
    pub target: ItemId,
}

struct DependencyGraph {
    graph: DiGraph<ItemRef, ()>,
    node_map: HashMap<ItemRef, NodeIndex>,
}

impl DependencyGraph {
    fn build(index: &Index) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for (item_type, entry) in index.iter() {
            let item = ItemRef::new(item_type, entry.id.clone());
            let node = graph.add_node(item.clone());
            node_map.insert(item, node);
        }

        for (item_type, entry) in index.iter() {
            let from = node_map[&ItemRef::new(item_type, entry.id.clone())];
            let targets: BTreeSet<ItemRef> = entry
                .links
                .prerequisites()
                .filter_map(|id| index.find(id).map(|(t, _)| ItemRef::new(t, id.clone())))
                .collect();
            for target in targets {
                graph.add_edge(from, node_map[&target], ());
            }
        }

        Self { graph, node_map }
    }
}

/// Every dependency cycle among indexed items.
///
/// A cycle is a strongly connected component with more than one member, or
/// a single item that lists itself. Members are sorted, and so are the
/// cycles.
#[must_use]
pub fn dependency_cycles(index: &Index) -> Vec<Vec<ItemRef>> {
    let DependencyGraph { graph, .. } = DependencyGraph::build(index);

    let mut cycles: Vec<Vec<ItemRef>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| match component.as_slice() {
            [single] => graph.contains_edge(*single, *single),
            members => members.len() > 1,
        })
        .map(|component| {
            let mut members: Vec<ItemRef> =
                component.into_iter().map(|node| graph[node].clone()).collect();
            members.sort();
            members
        })
        .collect();
    cycles.sort();
    cycles
}

/// Unfinished items with at least one unfinished, indexed prerequisite.
#[must_use]
pub fn blocked_items(index: &Index) -> Vec<BlockedItem> {
    let DependencyGraph { graph, node_map } = DependencyGraph::build(index);
    let finished = |item: &ItemRef| {
        index
            .get(item.item_type, &item.id)
            .is_some_and(|entry| entry.status.is_finished())
    };

    let mut blocked = Vec::new();
    for (item_type, entry) in index.iter() {
        if entry.status.is_finished() {
            continue;
        }
        let item = ItemRef::new(item_type, entry.id.clone());
        let Some(&node) = node_map.get(&item) else {
            continue;
        };

        let mut blockers: Vec<ItemRef> = graph
            .neighbors(node)
            .map(|n| graph[n].clone())
            .filter(|blocker| !finished(blocker))
            .collect();
        if blockers.is_empty() {
            continue;
        }
        blockers.sort();
        blockers.dedup();
        blocked.push(BlockedItem { item, blockers });
    }
    blocked
}

fn parent_field(parent_type: ItemType) -> &'static str {
    match parent_type {
        ItemType::Project => "projectId",
        ItemType::Epic => "epicId",
        ItemType::Issue => "issueId",
        ItemType::Task => "parentTask",
        ItemType::Pr => "prId",
    }
}

/// Parent references and authored relations whose target is not indexed.
#[must_use]
pub fn dangling_links(index: &Index) -> Vec<DanglingLink> {
    let mut dangling = Vec::new();
    for (item_type, entry) in index.iter() {
        let from = ItemRef::new(item_type, entry.id.clone());

        for (parent_type, parent) in entry.parents.iter() {
            if index.get(parent_type, parent).is_none() {
                dangling.push(DanglingLink {
                    from: from.clone(),
                    relation: parent_field(parent_type),
                    target: parent.clone(),
                });
            }
        }

        for (relation, target) in entry.links.iter() {
            if index.find(target).is_none() {
                dangling.push(DanglingLink {
                    from: from.clone(),
                    relation,
                    target: target.clone(),
                });
            }
        }
    }
    dangling
}
