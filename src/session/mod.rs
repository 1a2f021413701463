// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The unit of live editing state: one graph plus its undo history.

use crate::history::History;
use crate::model::Graph;

/// Owns the graph being edited and the history tracking it. The two always
/// travel together; handing them out separately ([`Session::parts_mut`]) is
/// how handlers mutate one while recording into the other.
#[derive(Debug, Default)]
pub struct Session {
    graph: Graph,
    history: History,
}

impl Session {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            history: History::new(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn parts_mut(&mut self) -> (&mut Graph, &mut History) {
        (&mut self.graph, &mut self.history)
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::model::{demo_graph, Graph, Node};

    #[test]
    fn session_starts_with_empty_history() {
        let session = Session::new(demo_graph());
        assert!(!session.graph().is_empty());
        assert!(session.history().is_empty());
    }

    #[test]
    fn parts_allow_recording_while_mutating() {
        let mut session = Session::new(Graph::new());
        let (graph, history) = session.parts_mut();

        history.record(graph);
        let id = graph.allocate_id();
        graph.insert(Node::new(id, "First"));

        assert_eq!(session.graph().len(), 1);
        assert_eq!(session.history().len(), 1);
    }
}
