// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Bounded undo/redo over graph snapshots.
//!
//! Handlers capture the pre-mutation snapshot, apply the mutation, and commit
//! the snapshot only on success, so a failed operation never leaves a no-op
//! entry on the undo stack.

use crate::model::{Graph, GraphSnapshot};

/// Maximum number of recorded snapshots; older entries are evicted.
pub const HISTORY_CAPACITY: usize = 30;

/// Linear undo/redo: a list of snapshots plus a cursor.
///
/// `cursor == entries.len()` means "at the live state, nothing undone".
/// Recording while undone discards the redo tail (standard undo-branch
/// semantics).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    entries: Vec<GraphSnapshot>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record the graph's current state as the pre-mutation snapshot.
    pub fn record(&mut self, graph: &Graph) {
        self.record_snapshot(graph.snapshot());
    }

    /// Commit a snapshot captured earlier (before a now-successful mutation).
    pub fn record_snapshot(&mut self, snapshot: GraphSnapshot) {
        self.entries.truncate(self.cursor);
        self.entries.push(snapshot);
        if self.entries.len() > HISTORY_CAPACITY {
            let overflow = self.entries.len() - HISTORY_CAPACITY;
            self.entries.drain(..overflow);
        }
        self.cursor = self.entries.len();
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Step back one snapshot, restoring it into `graph`. The live state is
    /// captured on the first step back so `redo` can return to it. Returns
    /// `false` (leaving `graph` untouched) when there is nothing to undo.
    pub fn undo(&mut self, graph: &mut Graph) -> bool {
        if !self.can_undo() {
            return false;
        }
        if self.cursor == self.entries.len() {
            self.entries.push(graph.snapshot());
        }
        self.cursor -= 1;
        graph.restore(&self.entries[self.cursor]);
        true
    }

    /// Step forward one snapshot. Returns `false` when there is nothing to
    /// redo.
    pub fn redo(&mut self, graph: &mut Graph) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        graph.restore(&self.entries[self.cursor]);
        true
    }
}
