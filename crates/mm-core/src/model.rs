//! Core data model for mind maps.
//!
//! A mind map is a flat graph: a list of typed nodes placed on a canvas and a
//! list of styled edges connecting them. Node payloads are a tagged union, one
//! variant per node kind, serialized with a `nodeType` discriminant so stored
//! JSON stays readable. Edges reference nodes by id only; whether both
//! endpoints exist is checked when the graph is exported, not when an edge
//! is inserted.

use crate::id::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ─── Geometry ────────────────────────────────────────────────────────────

/// Canvas position of a node's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

// ─── Node payloads ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    Diamond,
    Triangle,
    Hexagon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KanbanColumn {
    pub title: String,
    #[serde(default)]
    pub cards: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Free-form date label as typed by the user (`"1687"`, `"Q3 2024"`).
    pub date: String,
    pub label: String,
}

/// Per-kind payload of a node.
///
/// The `nodeType` tag doubles as the renderer key on the canvas side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "nodeType", rename_all = "camelCase")]
pub enum NodeData {
    Topic {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    Note {
        #[serde(default)]
        text: String,
    },
    Shape {
        #[serde(default)]
        shape: ShapeKind,
        #[serde(default)]
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
    },
    Checklist {
        #[serde(default)]
        title: String,
        #[serde(default)]
        items: Vec<ChecklistItem>,
    },
    Flashcard {
        #[serde(default)]
        front: String,
        #[serde(default)]
        back: String,
    },
    Quiz {
        #[serde(default)]
        question: String,
        #[serde(default)]
        options: SmallVec<[String; 4]>,
        /// Index into `options` of the correct answer.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        answer: Option<usize>,
    },
    Kanban {
        #[serde(default)]
        title: String,
        #[serde(default)]
        columns: Vec<KanbanColumn>,
    },
    Table {
        #[serde(default)]
        headers: Vec<String>,
        #[serde(default)]
        rows: Vec<Vec<String>>,
    },
    Chart {
        #[serde(default)]
        title: String,
        #[serde(default)]
        chart: ChartKind,
        #[serde(default)]
        points: Vec<ChartPoint>,
    },
    Timeline {
        #[serde(default)]
        title: String,
        #[serde(default)]
        events: Vec<TimelineEvent>,
    },
    Image {
        url: String,
        #[serde(default)]
        caption: String,
    },
    Link {
        url: String,
        #[serde(default)]
        label: String,
    },
}

/// The discriminant of [`NodeData`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Topic,
    Note,
    Shape,
    Checklist,
    Flashcard,
    Quiz,
    Kanban,
    Table,
    Chart,
    Timeline,
    Image,
    Link,
}

impl NodeKind {
    pub const ALL: [NodeKind; 12] = [
        NodeKind::Topic,
        NodeKind::Note,
        NodeKind::Shape,
        NodeKind::Checklist,
        NodeKind::Flashcard,
        NodeKind::Quiz,
        NodeKind::Kanban,
        NodeKind::Table,
        NodeKind::Chart,
        NodeKind::Timeline,
        NodeKind::Image,
        NodeKind::Link,
    ];

    /// The `nodeType` tag string, also used as the id prefix for new nodes.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Topic => "topic",
            NodeKind::Note => "note",
            NodeKind::Shape => "shape",
            NodeKind::Checklist => "checklist",
            NodeKind::Flashcard => "flashcard",
            NodeKind::Quiz => "quiz",
            NodeKind::Kanban => "kanban",
            NodeKind::Table => "table",
            NodeKind::Chart => "chart",
            NodeKind::Timeline => "timeline",
            NodeKind::Image => "image",
            NodeKind::Link => "link",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown node type `{s}`"))
    }
}

/// Failure to apply a JSON patch to a node payload.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("patch must be a JSON object")]
    NotAnObject,
    #[error("failed to encode node data: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("patched node data is invalid: {0}")]
    Invalid(#[source] serde_json::Error),
}

impl NodeData {
    /// Default payload for a freshly added node of `kind`.
    pub fn template(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Topic => NodeData::Topic {
                label: "New topic".into(),
                color: None,
            },
            NodeKind::Note => NodeData::Note {
                text: String::new(),
            },
            NodeKind::Shape => NodeData::Shape {
                shape: ShapeKind::Rectangle,
                label: String::new(),
                fill: None,
            },
            NodeKind::Checklist => NodeData::Checklist {
                title: "Checklist".into(),
                items: Vec::new(),
            },
            NodeKind::Flashcard => NodeData::Flashcard {
                front: "Question".into(),
                back: "Answer".into(),
            },
            NodeKind::Quiz => NodeData::Quiz {
                question: "Question".into(),
                options: SmallVec::new(),
                answer: None,
            },
            NodeKind::Kanban => NodeData::Kanban {
                title: "Board".into(),
                columns: ["To do", "Doing", "Done"]
                    .into_iter()
                    .map(|title| KanbanColumn {
                        title: title.into(),
                        cards: Vec::new(),
                    })
                    .collect(),
            },
            NodeKind::Table => NodeData::Table {
                headers: vec!["Column 1".into(), "Column 2".into()],
                rows: vec![vec![String::new(), String::new()]],
            },
            NodeKind::Chart => NodeData::Chart {
                title: "Chart".into(),
                chart: ChartKind::Bar,
                points: Vec::new(),
            },
            NodeKind::Timeline => NodeData::Timeline {
                title: "Timeline".into(),
                events: Vec::new(),
            },
            NodeKind::Image => NodeData::Image {
                url: String::new(),
                caption: String::new(),
            },
            NodeKind::Link => NodeData::Link {
                url: String::new(),
                label: String::new(),
            },
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Topic { .. } => NodeKind::Topic,
            NodeData::Note { .. } => NodeKind::Note,
            NodeData::Shape { .. } => NodeKind::Shape,
            NodeData::Checklist { .. } => NodeKind::Checklist,
            NodeData::Flashcard { .. } => NodeKind::Flashcard,
            NodeData::Quiz { .. } => NodeKind::Quiz,
            NodeData::Kanban { .. } => NodeKind::Kanban,
            NodeData::Table { .. } => NodeKind::Table,
            NodeData::Chart { .. } => NodeKind::Chart,
            NodeData::Timeline { .. } => NodeKind::Timeline,
            NodeData::Image { .. } => NodeKind::Image,
            NodeData::Link { .. } => NodeKind::Link,
        }
    }

    /// Short human-readable caption, used for listings.
    pub fn caption(&self) -> &str {
        match self {
            NodeData::Topic { label, .. }
            | NodeData::Shape { label, .. }
            | NodeData::Link { label, .. } => label.as_str(),
            NodeData::Note { text } => text.lines().next().unwrap_or(""),
            NodeData::Checklist { title, .. }
            | NodeData::Kanban { title, .. }
            | NodeData::Chart { title, .. }
            | NodeData::Timeline { title, .. } => title.as_str(),
            NodeData::Flashcard { front, .. } => front.as_str(),
            NodeData::Quiz { question, .. } => question.as_str(),
            NodeData::Table { headers, .. } => headers.first().map_or("", String::as_str),
            NodeData::Image { caption, .. } => caption.as_str(),
        }
    }

    /// Merge a partial JSON object over this payload and re-validate.
    ///
    /// Objects merge key by key, `null` removes a key (falling back to the
    /// field default), anything else replaces. The result must still be a
    /// valid `NodeData`; a patch may switch `nodeType` only if the remaining
    /// fields fit the new variant.
    pub fn patched(&self, patch: &Value) -> Result<NodeData, PatchError> {
        if !patch.is_object() {
            return Err(PatchError::NotAnObject);
        }
        let mut value = serde_json::to_value(self).map_err(PatchError::Encode)?;
        merge_json(&mut value, patch);
        serde_json::from_value(value).map_err(PatchError::Invalid)
    }
}

fn merge_json(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                if value.is_null() {
                    target.remove(key);
                } else {
                    merge_json(target.entry(key.clone()).or_insert(Value::Null), value);
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// A typed node placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub position: Position,
    pub data: NodeData,
}

impl Node {
    pub fn new(id: NodeId, position: Position, data: NodeData) -> Self {
        Self { id, position, data }
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Arrow head placement on an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrowKind {
    #[default]
    None,
    Start,
    End,
    Both,
}

impl ArrowKind {
    fn at_start(self) -> bool {
        matches!(self, ArrowKind::Start | ArrowKind::Both)
    }

    fn at_end(self) -> bool {
        matches!(self, ArrowKind::End | ArrowKind::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerKind {
    #[default]
    ArrowClosed,
    Arrow,
}

/// Arrow marker drawn at one end of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    #[serde(rename = "type")]
    pub kind: MarkerKind,
    pub color: String,
}

/// Visual attributes of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke_color: String,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    pub arrow: ArrowKind,
    pub animated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            stroke_color: "#64748b".into(),
            stroke_width: 2.0,
            stroke_style: StrokeStyle::Solid,
            arrow: ArrowKind::None,
            animated: false,
            label: None,
        }
    }
}

/// Partial update for an edge's style. `None` fields are left untouched;
/// an empty `label` clears the label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EdgePatch {
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f64>,
    pub stroke_style: Option<StrokeStyle>,
    pub arrow: Option<ArrowKind>,
    pub animated: Option<bool>,
    pub label: Option<String>,
}

impl EdgePatch {
    pub fn is_empty(&self) -> bool {
        *self == EdgePatch::default()
    }
}

/// A styled connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub data: EdgeStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_start: Option<Marker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<Marker>,
}

impl Edge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            data: EdgeStyle::default(),
            marker_start: None,
            marker_end: None,
        }
    }

    /// Apply a style patch and re-derive the arrow markers.
    pub fn apply(&mut self, patch: &EdgePatch) {
        let style = &mut self.data;
        if let Some(color) = &patch.stroke_color {
            style.stroke_color = color.clone();
        }
        if let Some(width) = patch.stroke_width {
            style.stroke_width = width.max(0.0);
        }
        if let Some(stroke_style) = patch.stroke_style {
            style.stroke_style = stroke_style;
        }
        if let Some(arrow) = patch.arrow {
            style.arrow = arrow;
        }
        if let Some(animated) = patch.animated {
            style.animated = animated;
        }
        if let Some(label) = &patch.label {
            style.label = (!label.is_empty()).then(|| label.clone());
        }
        self.sync_markers();
    }

    /// Markers mirror `data.arrow` and take the stroke color.
    pub fn sync_markers(&mut self) {
        let marker = || Marker {
            kind: MarkerKind::ArrowClosed,
            color: self.data.stroke_color.clone(),
        };
        self.marker_start = self.data.arrow.at_start().then(marker);
        self.marker_end = self.data.arrow.at_end().then(marker);
    }

    pub fn touches(&self, id: NodeId) -> bool {
        self.source == id || self.target == id
    }
}

// ─── Graph ───────────────────────────────────────────────────────────────

/// The full node + edge state of one mind map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    /// First edge going from `source` to `target`, if any.
    pub fn find_edge(&self, source: NodeId, target: NodeId) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|e| e.source == source && e.target == target)
    }

    fn id_in_use(&self, id: NodeId) -> bool {
        self.contains_node(id) || self.edge(id).is_some()
    }

    /// A new id with `prefix` that no node or edge of this graph uses.
    pub fn fresh_node_id(&self, prefix: &str) -> NodeId {
        loop {
            let id = NodeId::with_prefix(prefix);
            if !self.id_in_use(id) {
                return id;
            }
        }
    }

    pub fn fresh_edge_id(&self) -> EdgeId {
        self.fresh_node_id("edge")
    }

    /// Remove a node and every edge touching it.
    /// Returns the removed node and the number of pruned edges.
    pub fn remove_node(&mut self, id: NodeId) -> Option<(Node, usize)> {
        let pos = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(pos);
        let before = self.edges.len();
        self.edges.retain(|e| !e.touches(id));
        Some((node, before - self.edges.len()))
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let pos = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(pos))
    }

    /// Edges whose source or target does not exist in this graph.
    pub fn dangling_edges(&self) -> Vec<EdgeId> {
        let ids: HashSet<NodeId> = self.nodes.iter().map(|n| n.id).collect();
        self.edges
            .iter()
            .filter(|e| !ids.contains(&e.source) || !ids.contains(&e.target))
            .map(|e| e.id)
            .collect()
    }

    /// A copy of this graph with dangling edges dropped.
    pub fn without_dangling_edges(&self) -> Graph {
        let dangling = self.dangling_edges();
        Graph {
            nodes: self.nodes.clone(),
            edges: self
                .edges
                .iter()
                .filter(|e| !dangling.contains(&e.id))
                .cloned()
                .collect(),
        }
    }
}
