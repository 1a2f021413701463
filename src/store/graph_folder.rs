// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::model::{Graph, Node, NodeId};

pub const GRAPH_DOC_FILENAME: &str = "naiad-graph.json";
pub const GRAPH_DOC_VERSION: u32 = 1;

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    UnsupportedVersion {
        path: PathBuf,
        version: u32,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
            Self::UnsupportedVersion { path, version } => {
                write!(f, "unsupported graph document version {version} at {path:?}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::UnsupportedVersion { .. } => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to stable storage where
    /// possible. Exact guarantees are platform/filesystem-dependent.
    Durable,
}

/// Serialized form of the graph document.
#[derive(Debug, Serialize, Deserialize)]
struct GraphDoc {
    version: u32,
    next_id: NodeId,
    #[serde(default)]
    central: Option<NodeId>,
    nodes: Vec<Node>,
}

/// A directory holding one graph document.
#[derive(Debug, Clone)]
pub struct GraphFolder {
    root: PathBuf,
    durability: WriteDurability,
}

impl GraphFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn graph_path(&self) -> PathBuf {
        self.root.join(GRAPH_DOC_FILENAME)
    }

    pub fn save_graph(&self, graph: &Graph) -> Result<(), StoreError> {
        let doc = GraphDoc {
            version: GRAPH_DOC_VERSION,
            next_id: graph.next_id(),
            central: graph.central(),
            nodes: graph.nodes().values().cloned().collect(),
        };

        let path = self.graph_path();
        let doc_str = serde_json::to_string_pretty(&doc).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        write_atomic(
            self.root(),
            &path,
            format!("{doc_str}\n").as_bytes(),
            self.durability,
        )
    }

    pub fn load_graph(&self) -> Result<Graph, StoreError> {
        let path = self.graph_path();
        let doc_str = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        let doc: GraphDoc = serde_json::from_str(&doc_str).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        if doc.version != GRAPH_DOC_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path,
                version: doc.version,
            });
        }

        Ok(Graph::from_parts(doc.nodes, doc.central, doc.next_id))
    }

    /// Load the stored graph, seeding and persisting a starter graph when the
    /// document does not exist yet.
    pub fn load_or_init_graph(&self) -> Result<Graph, StoreError> {
        match self.load_graph() {
            Ok(graph) => Ok(graph),
            Err(StoreError::Io { path, source })
                if source.kind() == io::ErrorKind::NotFound && path == self.graph_path() =>
            {
                let graph = initial_graph();
                self.save_graph(&graph)?;
                Ok(graph)
            }
            Err(err) => Err(err),
        }
    }
}

fn initial_graph() -> Graph {
    let mut graph = Graph::new();
    let id = graph.allocate_id();
    let mut root = Node::new(id, "Welcome");
    root.x = Some(0.0);
    root.y = Some(0.0);
    graph.insert(root);
    graph.set_central(Some(id));
    graph
}

fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = fs::remove_file(to);
                fs::rename(from, to)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}

fn write_atomic(
    root: &Path,
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    fs::create_dir_all(root).map_err(|source| StoreError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let Some(parent) = path.parent() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no parent"),
        });
    };

    let Some(file_name) = path.file_name() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no file name"),
        });
    };

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(
        ".naiad.tmp.{}.{}",
        file_name.to_string_lossy(),
        nanos
    ));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;

    file.write_all(contents).map_err(|source| StoreError::Io {
        path: tmp_path.clone(),
        source,
    })?;

    if durability == WriteDurability::Durable {
        file.sync_all().map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
    }
    drop(file);

    if let Err(source) = rename_overwrite(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            let dir = fs::File::open(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
            dir.sync_all().map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(())
}
