// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core graph model: nodes, the node store, and demo fixtures.

mod fixtures;
mod graph;
mod node;

pub use fixtures::demo_graph;
pub use graph::{Graph, GraphSnapshot};
pub use node::{node_size, EdgeType, Node, NodeId, Urgency, PLACEHOLDER_LABEL};
