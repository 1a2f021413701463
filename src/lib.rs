// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Naiad is the backend of an interactive mind-map editor: a node graph with
//! parent/child structure, a JSON line protocol for canvas events, bounded
//! undo/redo, and a single-worker queue that serializes all mutations.

pub mod dispatch;
pub mod history;
pub mod model;
pub mod ops;
pub mod protocol;
pub mod queue;
pub mod session;
pub mod store;
