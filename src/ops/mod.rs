// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mutation operations over the node graph.
//!
//! Operations are transport-agnostic: they are called directly for local
//! edits and from the dispatch layer for message-driven edits, and always
//! return a typed failure instead of panicking on bad external input.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use crate::model::{EdgeType, Graph, Node, NodeId, Urgency, PLACEHOLDER_LABEL};

/// Input for [`insert_node`]; absent optional fields take the documented
/// defaults (urgency medium, empty tag/description, default edge type,
/// unplaced coordinates).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewNode {
    pub label: String,
    pub description: String,
    pub urgency: Urgency,
    pub tag: String,
    pub parent: Option<NodeId>,
    pub edge_type: EdgeType,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

/// What to do with a label that is empty after trimming. The choice is
/// explicit per call site: interactive creation substitutes a placeholder,
/// programmatic callers usually want the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPolicy {
    Reject,
    Placeholder,
}

/// Partial update for [`edit_node`]; `None` fields are untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub label: Option<String>,
    pub description: Option<String>,
    pub urgency: Option<Urgency>,
    pub tag: Option<String>,
    pub edge_type: Option<EdgeType>,
}

/// One entry of a bulk position update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionUpdate {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

/// Per-entry outcome of [`apply_positions`]; valid entries are applied even
/// when siblings fail (no rollback).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionReport {
    pub applied: Vec<NodeId>,
    pub rejected: Vec<(NodeId, OpError)>,
}

/// Result of [`delete_subtree`]: the removed ids (root first, then
/// ascending) and whether the focused node was among them. Choosing a
/// replacement central is the caller's follow-up step.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOutcome {
    pub removed: Vec<NodeId>,
    pub central_removed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Node,
    Parent,
    Child,
}

impl RefKind {
    fn label(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Parent => "parent",
            Self::Child => "child",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpError {
    EmptyLabel,
    NotFound { kind: RefKind, id: NodeId },
    SelfParent { id: NodeId },
    CircularReference { child_id: NodeId, parent_id: NodeId },
    InvalidCoordinate { id: NodeId, axis: &'static str, value: f64 },
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLabel => f.write_str("label must not be empty"),
            Self::NotFound { kind, id } => {
                write!(f, "{} not found (id={id})", kind.label())
            }
            Self::SelfParent { id } => {
                write!(f, "node {id} cannot be its own parent")
            }
            Self::CircularReference { child_id, parent_id } => write!(
                f,
                "reparenting {child_id} under {parent_id} would create a cycle"
            ),
            Self::InvalidCoordinate { id, axis, value } => {
                write!(f, "invalid {axis} coordinate for node {id}: {value}")
            }
        }
    }
}

impl std::error::Error for OpError {}

/// Allocate an id, apply field defaults, compute the derived size, append.
///
/// Fails only on an empty post-trim label under [`LabelPolicy::Reject`]; the
/// parent reference, when present, must resolve.
pub fn insert_node(
    graph: &mut Graph,
    new_node: NewNode,
    label_policy: LabelPolicy,
) -> Result<NodeId, OpError> {
    let trimmed = new_node.label.trim();
    let label = if trimmed.is_empty() {
        match label_policy {
            LabelPolicy::Reject => return Err(OpError::EmptyLabel),
            LabelPolicy::Placeholder => PLACEHOLDER_LABEL,
        }
    } else {
        trimmed
    };

    if let Some(parent) = new_node.parent {
        if !graph.contains(parent) {
            return Err(OpError::NotFound {
                kind: RefKind::Parent,
                id: parent,
            });
        }
    }

    let id = graph.allocate_id();
    let mut node = Node::new(id, label);
    node.description = new_node.description;
    node.urgency = new_node.urgency;
    node.tag = new_node.tag;
    node.parent = new_node.parent;
    node.edge_type = new_node.edge_type;
    node.x = new_node.x;
    node.y = new_node.y;
    node.recompute_size();
    graph.insert(node);

    Ok(id)
}

/// Apply a partial update to an existing node; the derived size is refreshed
/// when the label or urgency changed. An empty post-trim label normalizes to
/// the placeholder rather than failing, matching interactive edit semantics.
pub fn edit_node(graph: &mut Graph, id: NodeId, patch: NodePatch) -> Result<(), OpError> {
    let node = graph.node_mut(id).ok_or(OpError::NotFound {
        kind: RefKind::Node,
        id,
    })?;

    let mut size_stale = false;

    if let Some(label) = patch.label {
        let trimmed = label.trim();
        node.label = if trimmed.is_empty() {
            PLACEHOLDER_LABEL.to_owned()
        } else {
            trimmed.to_owned()
        };
        size_stale = true;
    }
    if let Some(description) = patch.description {
        node.description = description;
    }
    if let Some(urgency) = patch.urgency {
        if urgency != node.urgency {
            node.urgency = urgency;
            size_stale = true;
        }
    }
    if let Some(tag) = patch.tag {
        node.tag = tag;
    }
    if let Some(edge_type) = patch.edge_type {
        node.edge_type = edge_type;
    }

    if size_stale {
        node.recompute_size();
    }

    Ok(())
}

/// Check whether making `parent_id` the parent of `child_id` would close a
/// cycle, by walking the parent chain upward from `parent_id`.
///
/// The walk is O(depth) and guards against revisiting: a revisit means the
/// stored data already contains an anomaly, and the reparent is rejected
/// rather than looping forever.
pub fn check_reparent(graph: &Graph, child_id: NodeId, parent_id: NodeId) -> Result<(), OpError> {
    if !graph.contains(child_id) {
        return Err(OpError::NotFound {
            kind: RefKind::Child,
            id: child_id,
        });
    }
    if !graph.contains(parent_id) {
        return Err(OpError::NotFound {
            kind: RefKind::Parent,
            id: parent_id,
        });
    }
    if child_id == parent_id {
        return Err(OpError::SelfParent { id: child_id });
    }

    let mut visited = BTreeSet::new();
    let mut current = Some(parent_id);
    while let Some(id) = current {
        if id == child_id || !visited.insert(id) {
            return Err(OpError::CircularReference {
                child_id,
                parent_id,
            });
        }
        current = graph.node(id).and_then(|node| node.parent);
    }

    Ok(())
}

/// Set `child_id`'s parent to `parent_id` after cycle validation.
pub fn reparent(graph: &mut Graph, child_id: NodeId, parent_id: NodeId) -> Result<(), OpError> {
    check_reparent(graph, child_id, parent_id)?;

    // check_reparent proved the child exists.
    if let Some(node) = graph.node_mut(child_id) {
        node.parent = Some(parent_id);
    }
    Ok(())
}

/// All nodes transitively below `root` (excluding `root` itself), in
/// ascending id order. Breadth-first over the reversed parent-pointer graph,
/// with a visited guard so even corrupted data cannot loop the traversal.
pub fn descendants(graph: &Graph, root: NodeId) -> Vec<NodeId> {
    let mut found = BTreeSet::new();
    let mut frontier = VecDeque::from([root]);

    while let Some(current) = frontier.pop_front() {
        for (id, node) in graph.nodes() {
            if node.parent == Some(current) && *id != root && found.insert(*id) {
                frontier.push_back(*id);
            }
        }
    }

    found.into_iter().collect()
}

/// Remove `root` and its whole descendant set.
///
/// A removed central is cleared (the store invariant forbids a dangling
/// focus) and flagged in the outcome; picking a replacement is left to the
/// caller.
pub fn delete_subtree(graph: &mut Graph, root: NodeId) -> Result<DeleteOutcome, OpError> {
    if !graph.contains(root) {
        return Err(OpError::NotFound {
            kind: RefKind::Node,
            id: root,
        });
    }

    let mut removed = vec![root];
    removed.extend(descendants(graph, root));

    let central_removed = graph
        .central()
        .is_some_and(|central| removed.contains(&central));

    for id in &removed {
        graph.remove(*id);
    }

    Ok(DeleteOutcome {
        removed,
        central_removed,
    })
}

/// Validate a coordinate pair without mutating; rejects NaN and infinities.
pub fn check_position(id: NodeId, x: f64, y: f64) -> Result<(), OpError> {
    if !x.is_finite() {
        return Err(OpError::InvalidCoordinate {
            id,
            axis: "x",
            value: x,
        });
    }
    if !y.is_finite() {
        return Err(OpError::InvalidCoordinate {
            id,
            axis: "y",
            value: y,
        });
    }
    Ok(())
}

/// Overwrite a single node's canvas position.
pub fn set_position(graph: &mut Graph, id: NodeId, x: f64, y: f64) -> Result<(), OpError> {
    check_position(id, x, y)?;
    let node = graph.node_mut(id).ok_or(OpError::NotFound {
        kind: RefKind::Node,
        id,
    })?;
    node.x = Some(x);
    node.y = Some(y);
    Ok(())
}

/// Apply a bulk position update, keeping every individually-valid entry and
/// reporting the rest; there is no all-or-nothing rollback.
pub fn apply_positions(graph: &mut Graph, updates: &[PositionUpdate]) -> PositionReport {
    let mut report = PositionReport::default();
    for update in updates {
        match set_position(graph, update.id, update.x, update.y) {
            Ok(()) => report.applied.push(update.id),
            Err(err) => report.rejected.push((update.id, err)),
        }
    }
    report
}
