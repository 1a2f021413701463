// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Small built-in graph used by `--demo` and tests.

use super::graph::Graph;
use super::node::{EdgeType, Node, Urgency};

pub fn demo_graph() -> Graph {
    let mut graph = Graph::new();

    let root_id = graph.allocate_id();
    let mut root = Node::new(root_id, "Naiad");
    root.description = "Demo mind map".to_owned();
    root.x = Some(0.0);
    root.y = Some(0.0);
    graph.insert(root);

    let protocol_id = graph.allocate_id();
    let mut protocol = Node::new(protocol_id, "Message protocol");
    protocol.parent = Some(root_id);
    protocol.urgency = Urgency::High;
    protocol.recompute_size();
    protocol.x = Some(-160.0);
    protocol.y = Some(-90.0);
    graph.insert(protocol);

    let history_id = graph.allocate_id();
    let mut history = Node::new(history_id, "Undo history");
    history.parent = Some(root_id);
    history.edge_type = EdgeType::Supports;
    history.x = Some(160.0);
    history.y = Some(-90.0);
    graph.insert(history);

    let queue_id = graph.allocate_id();
    let mut queue = Node::new(queue_id, "Worker queue");
    queue.parent = Some(protocol_id);
    queue.tag = "infra".to_owned();
    queue.x = Some(-220.0);
    queue.y = Some(40.0);
    graph.insert(queue);

    graph.set_central(Some(root_id));
    graph
}

#[cfg(test)]
mod tests {
    use super::demo_graph;

    #[test]
    fn demo_graph_has_a_central_root() {
        let graph = demo_graph();
        assert_eq!(graph.len(), 4);
        let central = graph.central().expect("central");
        let root = graph.node(central).expect("central resolves");
        assert_eq!(root.parent, None);
    }
}
