//! Persisted units: named mind-map records and the auto-save configuration.

use crate::model::{Edge, Graph, Node};
use serde::{Deserialize, Serialize};

/// A named mind map as stored in the `mindmaps` bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapRecord {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl MindMapRecord {
    pub fn new(name: impl Into<String>, graph: &Graph) -> Self {
        Self {
            name: name.into(),
            nodes: graph.nodes.clone(),
            edges: graph.edges.clone(),
        }
    }

    pub fn into_graph(self) -> Graph {
        Graph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

/// User-facing auto-save settings, persisted in the `autoSaveConfig` bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoSaveConfig {
    pub enabled: bool,
    /// Minimum time between two automatic saves, in milliseconds.
    pub interval: u64,
    /// Epoch milliseconds of the last successful save (manual or automatic).
    pub last_save_time: u64,
}

impl AutoSaveConfig {
    pub const DEFAULT_INTERVAL_MS: u64 = 30_000;
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Self::DEFAULT_INTERVAL_MS,
            last_save_time: 0,
        }
    }
}
