// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use super::node::{Node, NodeId};

/// The authoritative node store for one editing session.
///
/// Invariant: `central` is either `None` or the id of a node currently in
/// `nodes`. Mutating entry points that can break this (deletion) must clear
/// or reassign it.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    central: Option<NodeId>,
    next_id: NodeId,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            central: None,
            next_id: 1,
        }
    }

    /// Rebuild a graph from persisted parts.
    ///
    /// Defensive on load: a `central` that does not resolve is dropped, and
    /// `next_id` is clamped above the highest stored id so allocation can
    /// never collide with loaded nodes.
    pub fn from_parts(nodes: Vec<Node>, central: Option<NodeId>, next_id: NodeId) -> Self {
        let nodes: BTreeMap<NodeId, Node> =
            nodes.into_iter().map(|node| (node.id, node)).collect();
        let min_next = nodes.keys().next_back().map_or(1, |max| max + 1);
        let central = central.filter(|id| nodes.contains_key(id));
        Self {
            nodes,
            central,
            next_id: next_id.max(min_next),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Hand out the next id and advance the counter.
    pub fn allocate_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn next_id(&self) -> NodeId {
        self.next_id
    }

    pub fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        if self.central == Some(id) {
            self.central = None;
        }
        self.nodes.remove(&id)
    }

    pub fn central(&self) -> Option<NodeId> {
        self.central
    }

    /// Set or clear the focused node. Returns `false` (leaving the previous
    /// value in place) when the referenced node does not exist.
    pub fn set_central(&mut self, central: Option<NodeId>) -> bool {
        match central {
            Some(id) if !self.nodes.contains_key(&id) => false,
            other => {
                self.central = other;
                true
            }
        }
    }

    /// Lowest-id node, used as the deterministic replacement central after a
    /// cascading delete.
    pub fn first_node_id(&self) -> Option<NodeId> {
        self.nodes.keys().next().copied()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            central: self.central,
        }
    }

    /// Restore `{nodes, central}` from a snapshot. `next_id` is deliberately
    /// untouched so undo never rewinds id allocation.
    pub fn restore(&mut self, snapshot: &GraphSnapshot) {
        self.nodes = snapshot.nodes.clone();
        self.central = snapshot.central;
    }
}

/// Immutable deep copy of `{nodes, central}` used for undo/redo.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSnapshot {
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) central: Option<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::{Graph, Node};

    #[test]
    fn allocate_id_is_monotonic() {
        let mut graph = Graph::new();
        let a = graph.allocate_id();
        let b = graph.allocate_id();
        assert!(b > a);
    }

    #[test]
    fn set_central_rejects_missing_node() {
        let mut graph = Graph::new();
        let id = graph.allocate_id();
        graph.insert(Node::new(id, "Root"));

        assert!(graph.set_central(Some(id)));
        assert!(!graph.set_central(Some(id + 1)));
        assert_eq!(graph.central(), Some(id));
        assert!(graph.set_central(None));
        assert_eq!(graph.central(), None);
    }

    #[test]
    fn remove_clears_central_pointing_at_removed_node() {
        let mut graph = Graph::new();
        let id = graph.allocate_id();
        graph.insert(Node::new(id, "Root"));
        graph.set_central(Some(id));

        graph.remove(id);
        assert_eq!(graph.central(), None);
    }

    #[test]
    fn restore_keeps_next_id_monotonic() {
        let mut graph = Graph::new();
        let a = graph.allocate_id();
        graph.insert(Node::new(a, "Root"));
        let snapshot = graph.snapshot();

        let b = graph.allocate_id();
        graph.insert(Node::new(b, "Child"));
        graph.restore(&snapshot);

        assert!(!graph.contains(b));
        assert!(graph.allocate_id() > b);
    }

    #[test]
    fn from_parts_drops_dangling_central_and_clamps_next_id() {
        let nodes = vec![Node::new(3, "Root"), Node::new(7, "Leaf")];
        let graph = Graph::from_parts(nodes, Some(99), 2);
        assert_eq!(graph.central(), None);
        assert_eq!(graph.next_id(), 8);
    }
}
