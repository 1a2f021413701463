// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Stable node identifier, allocated monotonically by [`Graph`](super::Graph).
///
/// Ids are never reused while a node is still reachable through history, so
/// the allocation counter only ever moves forward.
pub type NodeId = u64;

/// Label substituted when a caller opts into placeholder semantics for an
/// empty (post-trim) label.
pub const PLACEHOLDER_LABEL: &str = "New Idea";

/// How strongly a node demands attention; drives visual size/color in the
/// presentation layer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    #[default]
    Medium,
    Low,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Semantic of the edge connecting a node to its parent; only meaningful
/// while `parent` is set.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    #[default]
    Default,
    Supports,
    Contradicts,
    Relates,
}

impl EdgeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Supports => "supports",
            Self::Contradicts => "contradicts",
            Self::Relates => "relates",
        }
    }
}

/// A single idea/bubble on the canvas.
///
/// `x`/`y` are node-space coordinates; `None` means "not yet placed" and the
/// presentation layer owns the pixel conversion. `size` is derived from the
/// label and urgency and must be recomputed whenever either changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub edge_type: EdgeType,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub size: f64,
}

impl Node {
    pub fn new(id: NodeId, label: impl Into<String>) -> Self {
        let label = label.into();
        let urgency = Urgency::default();
        let size = node_size(&label, urgency);
        Self {
            id,
            label,
            description: String::new(),
            urgency,
            tag: String::new(),
            parent: None,
            edge_type: EdgeType::default(),
            x: None,
            y: None,
            size,
        }
    }

    /// Refresh the derived `size` after a label or urgency change.
    pub fn recompute_size(&mut self) {
        self.size = node_size(&self.label, self.urgency);
    }
}

/// Derived bubble size: an urgency base plus a capped label contribution, so
/// long labels grow the bubble without dwarfing the canvas.
pub fn node_size(label: &str, urgency: Urgency) -> f64 {
    let base = match urgency {
        Urgency::High => 28.0,
        Urgency::Medium => 20.0,
        Urgency::Low => 14.0,
    };
    let label_units = label.chars().count().min(24) as f64;
    base + label_units * 0.75
}
