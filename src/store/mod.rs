// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! On-disk persistence for the node graph.

mod graph_folder;

pub use graph_folder::{
    GraphFolder, StoreError, WriteDurability, GRAPH_DOC_FILENAME, GRAPH_DOC_VERSION,
};
