//! JSON export/import of a single mind map.
//!
//! The export document is the record plus an `exportedAt` timestamp. Dangling
//! edges are dropped on the way out so an exported file is always renderable.

use crate::model::{Edge, Graph, Node};
use crate::record::MindMapRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

impl From<ExportDocument> for MindMapRecord {
    fn from(doc: ExportDocument) -> Self {
        MindMapRecord {
            name: doc.name,
            nodes: doc.nodes,
            edges: doc.edges,
        }
    }
}

/// A ready-to-write export: suggested file name plus pretty JSON contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

/// Build the export file for `graph` under `name`, stamped with `at`.
pub fn export_file(
    name: &str,
    graph: &Graph,
    at: DateTime<Utc>,
) -> Result<ExportFile, serde_json::Error> {
    let clean = graph.without_dangling_edges();
    let dropped = graph.edges.len() - clean.edges.len();
    if dropped > 0 {
        log::warn!("export `{name}`: dropped {dropped} dangling edge(s)");
    }
    let doc = ExportDocument {
        name: name.to_string(),
        nodes: clean.nodes,
        edges: clean.edges,
        exported_at: Some(at),
    };
    Ok(ExportFile {
        file_name: export_file_name(name, at),
        contents: serde_json::to_string_pretty(&doc)?,
    })
}

/// `mindmap-<slug>-<YYYY-MM-DD>.json`
pub fn export_file_name(name: &str, at: DateTime<Utc>) -> String {
    format!("mindmap-{}-{}.json", slug(name), at.format("%Y-%m-%d"))
}

/// Parse an exported document (or a bare stored record) back into a record.
pub fn parse_export(json: &str) -> Result<MindMapRecord, serde_json::Error> {
    let doc: ExportDocument = serde_json::from_str(json)?;
    Ok(doc.into())
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("untitled");
    }
    out
}
