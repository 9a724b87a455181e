//! Editor session: the live graph plus everything that coordinates around it.
//!
//! A `Session` is constructed explicitly by whatever hosts the canvas and
//! lives as long as the editor view. It owns:
//!
//! - the live [`Graph`] (single source of truth),
//! - the [`History`] snapshot stack,
//! - the [`AutoSave`] scheduler,
//! - the persistence gateway ([`MindMapStore`]),
//! - the clock and the outbox of user-visible [`Notice`]s.
//!
//! Every façade mutation applies its change and then runs the change
//! observer, which records the new state in history and stamps the edit time
//! for auto-save. Undo/redo write a snapshot back and run the same observer;
//! the history's suppression flag turns that echo into a no-op.

use crate::autosave::{AutoSave, AutoSaveSettings, AutoSaveState, TickOutcome};
use crate::clock::Clock;
use crate::history::{History, MAX_HISTORY_LENGTH};
use crate::notice::{Notice, NoticeLevel};
use mm_core::export::{ExportFile, export_file, parse_export};
use mm_core::gateway::MindMapStore;
use mm_core::id::{EdgeId, NodeId};
use mm_core::model::{Edge, EdgePatch, Graph, Node, NodeData, NodeKind, Position};
use mm_core::record::{AutoSaveConfig, MindMapRecord};
use mm_core::storage::KeyValueStore;
use serde_json::Value;

/// Offset applied to duplicated and pasted nodes.
const CLONE_OFFSET: f64 = 20.0;
/// New nodes are laid out on a grid of this many columns.
const GRID_COLUMNS: usize = 5;
const GRID_ORIGIN: Position = Position::new(100.0, 100.0);
const GRID_STEP_X: f64 = 220.0;
const GRID_STEP_Y: f64 = 160.0;

/// Construction-time configuration for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Bound on the undo stack. Default: **50**.
    pub max_history: usize,
    pub auto_save: AutoSaveSettings,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_history: MAX_HISTORY_LENGTH,
            auto_save: AutoSaveSettings::default(),
        }
    }
}

pub struct Session<S> {
    graph: Graph,
    history: History,
    auto_save: AutoSave,
    store: MindMapStore<S>,
    clock: Box<dyn Clock>,
    current_name: Option<String>,
    notices: Vec<Notice>,
}

impl<S: KeyValueStore> Session<S> {
    /// Open a session on an empty, unnamed graph. The auto-save config is
    /// read from `store`.
    pub fn new(store: MindMapStore<S>, clock: impl Clock + 'static, options: SessionOptions) -> Self {
        let config = store.load_auto_save_config();
        let mut session = Self {
            graph: Graph::new(),
            history: History::new(options.max_history),
            auto_save: AutoSave::new(config, options.auto_save),
            store,
            clock: Box::new(clock),
            current_name: None,
            notices: Vec::new(),
        };
        session.replace_graph(None, Graph::new());
        session
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current_name.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn store(&self) -> &MindMapStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MindMapStore<S> {
        &mut self.store
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn auto_save_config(&self) -> &AutoSaveConfig {
        self.auto_save.config()
    }

    pub fn auto_save_settings(&self) -> &AutoSaveSettings {
        self.auto_save.settings()
    }

    pub fn auto_save_state(&self) -> AutoSaveState {
        self.auto_save.state()
    }

    pub fn list_mind_maps(&self) -> Vec<String> {
        self.store.list_names()
    }

    /// Drain queued notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ─── Graph mutation façade ───────────────────────────────────────────

    /// Add a node of `kind`. `initial` is a partial payload merged over the
    /// kind's template.
    pub fn add_node(&mut self, kind: NodeKind, initial: Option<&Value>) -> Option<NodeId> {
        let mut data = NodeData::template(kind);
        if let Some(patch) = initial {
            match data.patched(patch) {
                Ok(patched) if patched.kind() == kind => data = patched,
                Ok(patched) => {
                    self.notify(Notice::error(format!(
                        "Initial data turns a {kind} node into a {}",
                        patched.kind()
                    )));
                    return None;
                }
                Err(e) => {
                    self.notify(Notice::error(format!("Invalid {kind} data: {e}")));
                    return None;
                }
            }
        }

        let id = self.graph.fresh_node_id(kind.as_str());
        let position = self.next_position();
        self.graph.nodes.push(Node::new(id, position, data));
        log::debug!("added {kind} node {id}");
        self.observe_change();
        Some(id)
    }

    /// Delete a node together with every edge touching it.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let Some((_, pruned)) = self.graph.remove_node(id) else {
            log::warn!("delete_node: no node {id}");
            return false;
        };
        log::debug!("deleted node {id} and {pruned} edge(s)");
        self.observe_change();
        true
    }

    /// Report the final position of a drag.
    pub fn move_node(&mut self, id: NodeId, position: Position) -> bool {
        let Some(node) = self.graph.node_mut(id) else {
            log::warn!("move_node: no node {id}");
            return false;
        };
        if node.position == position {
            return true;
        }
        node.position = position;
        self.observe_change();
        true
    }

    /// Merge a partial JSON payload into a node's data.
    pub fn update_node_data(&mut self, id: NodeId, patch: &Value) -> bool {
        let Some(current) = self.graph.node(id).map(|n| n.data.clone()) else {
            log::warn!("update_node_data: no node {id}");
            return false;
        };
        let updated = match current.patched(patch) {
            Ok(updated) => updated,
            Err(e) => {
                self.notify(Notice::error(format!("Could not update node {id}: {e}")));
                return false;
            }
        };
        if updated == current {
            return true;
        }
        if let Some(node) = self.graph.node_mut(id) {
            node.data = updated;
        }
        self.observe_change();
        true
    }

    /// Connect `source` → `target`. Endpoints are not validated here; an
    /// existing identical connection is reused.
    pub fn connect_edge(&mut self, source: NodeId, target: NodeId) -> Option<EdgeId> {
        if let Some(existing) = self.graph.find_edge(source, target) {
            return Some(existing.id);
        }
        if !self.graph.contains_node(source) || !self.graph.contains_node(target) {
            log::warn!("edge {source} -> {target} is dangling until both nodes exist");
        }
        let id = self.graph.fresh_edge_id();
        self.graph.edges.push(Edge::new(id, source, target));
        self.observe_change();
        Some(id)
    }

    pub fn update_edge(&mut self, id: EdgeId, patch: &EdgePatch) -> bool {
        let Some(edge) = self.graph.edge_mut(id) else {
            log::warn!("update_edge: no edge {id}");
            return false;
        };
        let before = edge.clone();
        edge.apply(patch);
        if *edge != before {
            self.observe_change();
        }
        true
    }

    pub fn delete_edge(&mut self, id: EdgeId) -> bool {
        if self.graph.remove_edge(id).is_none() {
            log::warn!("delete_edge: no edge {id}");
            return false;
        }
        self.observe_change();
        true
    }

    /// Put a node into the clipboard slot. Not a history entry.
    pub fn copy_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.graph.node(id).cloned() else {
            log::warn!("copy_node: no node {id}");
            return false;
        };
        if self.store.set_clipboard(&node) {
            self.notify(Notice::success("Node copied"));
            true
        } else {
            self.notify(Notice::error("Failed to copy node"));
            false
        }
    }

    /// Paste the clipboard node under a fresh id. With a `target`, the copy is
    /// placed next to it and connected `target → copy`.
    pub fn paste_node(&mut self, target: Option<NodeId>) -> Option<NodeId> {
        let Some(copied) = self.store.clipboard() else {
            self.notify(Notice::info("Nothing to paste"));
            return None;
        };
        let target = target.filter(|&t| {
            let exists = self.graph.contains_node(t);
            if !exists {
                log::warn!("paste_node: target {t} not found; pasting unattached");
            }
            exists
        });
        let anchor = target
            .and_then(|t| self.graph.node(t))
            .map_or(copied.position, |n| n.position);

        let id = self.graph.fresh_node_id(copied.kind().as_str());
        self.graph.nodes.push(Node::new(
            id,
            anchor.offset(CLONE_OFFSET, CLONE_OFFSET),
            copied.data,
        ));
        if let Some(t) = target {
            let edge_id = self.graph.fresh_edge_id();
            self.graph.edges.push(Edge::new(edge_id, t, id));
        }
        self.observe_change();
        self.notify(Notice::success("Node pasted"));
        Some(id)
    }

    pub fn duplicate_node(&mut self, id: NodeId) -> Option<NodeId> {
        let Some(original) = self.graph.node(id).cloned() else {
            log::warn!("duplicate_node: no node {id}");
            return None;
        };
        let new_id = self.graph.fresh_node_id(original.kind().as_str());
        self.graph.nodes.push(Node::new(
            new_id,
            original.position.offset(CLONE_OFFSET, CLONE_OFFSET),
            original.data,
        ));
        self.observe_change();
        Some(new_id)
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        let now = self.clock.now_ms();
        let Some(snapshot) = self.history.undo(&self.graph, now) else {
            return false;
        };
        self.graph = snapshot.into_graph();
        self.observe_change();
        self.notify(Notice::success("Undo"));
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.graph = snapshot.into_graph();
        self.observe_change();
        self.notify(Notice::success("Redo"));
        true
    }

    // ─── Mind-map lifecycle ──────────────────────────────────────────────

    /// Create and open an empty mind map. Rejects empty and taken names.
    pub fn create_new_mind_map(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            self.notify(Notice::error("Mind map name cannot be empty"));
            return false;
        }
        if self.store.contains(name) {
            self.notify(Notice::error(format!(
                "A mind map named \"{name}\" already exists"
            )));
            return false;
        }
        let blank = Graph::new();
        if !self.store.save(&MindMapRecord::new(name, &blank)) {
            self.notify(Notice::error(format!("Failed to create \"{name}\"")));
            return false;
        }
        self.replace_graph(Some(name.to_string()), blank);
        self.notify(Notice::success(format!("Created \"{name}\"")));
        true
    }

    pub fn load_existing_mind_map(&mut self, name: &str) -> bool {
        let Some(record) = self.store.load(name) else {
            self.notify(Notice::error(format!("Mind map \"{name}\" not found")));
            return false;
        };
        let name = record.name.clone();
        self.replace_graph(Some(name.clone()), record.into_graph());
        self.notify(Notice::success(format!("Loaded \"{name}\"")));
        true
    }

    pub fn save_current_mind_map(&mut self) -> bool {
        let Some(name) = self.current_name.clone() else {
            self.notify(Notice::error(
                "No mind map is open; create or load one first",
            ));
            return false;
        };
        if self.write_current(&name) {
            self.notify(Notice::success(format!("Saved \"{name}\"")));
            true
        } else {
            self.notify(Notice::error(format!("Failed to save \"{name}\"")));
            false
        }
    }

    /// Delete a stored mind map. Deleting the open one leaves an empty,
    /// unnamed canvas.
    pub fn delete_mind_map(&mut self, name: &str) -> bool {
        if !self.store.contains(name) {
            self.notify(Notice::error(format!("Mind map \"{name}\" not found")));
            return false;
        }
        if !self.store.delete(name) {
            self.notify(Notice::error(format!("Failed to delete \"{name}\"")));
            return false;
        }
        if self.current_name.as_deref() == Some(name) {
            self.replace_graph(None, Graph::new());
        }
        self.notify(Notice::success(format!("Deleted \"{name}\"")));
        true
    }

    /// Build the export file for the open graph.
    pub fn export_current(&mut self) -> Option<ExportFile> {
        let name = self.current_name.clone().unwrap_or_else(|| "Untitled".into());
        match export_file(&name, &self.graph, self.clock.now_utc()) {
            Ok(file) => {
                self.notify(Notice::success(format!("Exported {}", file.file_name)));
                Some(file)
            }
            Err(e) => {
                self.notify(Notice::error(format!("Export failed: {e}")));
                None
            }
        }
    }

    /// Import an exported document as a new mind map and open it.
    pub fn import_mind_map(&mut self, json: &str) -> bool {
        let record = match parse_export(json) {
            Ok(record) => record,
            Err(e) => {
                self.notify(Notice::error(format!("Invalid mind map file: {e}")));
                return false;
            }
        };
        let name = record.name.trim().to_string();
        if name.is_empty() || self.store.contains(&name) {
            self.notify(Notice::error(format!(
                "Cannot import \"{name}\": name is empty or already taken"
            )));
            return false;
        }
        let record = MindMapRecord { name, ..record };
        if !self.store.save(&record) {
            self.notify(Notice::error(format!("Failed to import \"{}\"", record.name)));
            return false;
        }
        let name = record.name.clone();
        self.replace_graph(Some(name.clone()), record.into_graph());
        self.notify(Notice::success(format!("Imported \"{name}\"")));
        true
    }

    // ─── Auto-save ───────────────────────────────────────────────────────

    pub fn set_auto_save_enabled(&mut self, enabled: bool) {
        self.auto_save.set_enabled(enabled);
        if self.persist_auto_save_config() {
            self.notify(Notice::info(if enabled {
                "Auto-save enabled"
            } else {
                "Auto-save disabled"
            }));
        }
    }

    pub fn set_auto_save_interval(&mut self, interval_ms: u64) {
        self.auto_save.set_interval(interval_ms);
        if self.persist_auto_save_config() {
            self.notify(Notice::info(format!(
                "Auto-save interval set to {} s",
                interval_ms as f64 / 1000.0
            )));
        }
    }

    /// One auto-save poll. Call every [`AutoSaveSettings::tick`].
    pub fn tick(&mut self) -> TickOutcome {
        let now = self.clock.now_ms();
        let name = self.current_name.clone();
        let store = &mut self.store;
        let graph = &self.graph;
        let outcome = self.auto_save.tick(now, name.is_some(), || {
            name.as_deref()
                .is_some_and(|n| store.save(&MindMapRecord::new(n, graph)))
        });

        match outcome {
            TickOutcome::Saved => {
                self.persist_auto_save_config();
                let name = name.unwrap_or_default();
                self.notify(Notice::info(format!("Auto-saved \"{name}\"")));
            }
            TickOutcome::Failed => {
                self.notify(Notice::error("Auto-save failed; will retry"));
            }
            _ => {}
        }
        outcome
    }

    // ─── Internals ───────────────────────────────────────────────────────

    /// The change observer: record history and stamp the edit time.
    fn observe_change(&mut self) {
        let now = self.clock.now_ms();
        self.history.record(&self.graph, now);
        self.auto_save.note_edit(now);
    }

    /// Swap in a different graph with fresh history.
    fn replace_graph(&mut self, name: Option<String>, graph: Graph) {
        self.graph = graph;
        self.current_name = name;
        self.history.clear();
        self.history.record(&self.graph, self.clock.now_ms());
        self.auto_save.reset_activity();
    }

    fn write_current(&mut self, name: &str) -> bool {
        if !self.store.save(&MindMapRecord::new(name, &self.graph)) {
            return false;
        }
        self.auto_save.mark_saved(self.clock.now_ms());
        self.persist_auto_save_config();
        true
    }

    /// Write the in-memory config through. A failure is reported as an
    /// error notice; the in-memory config stays authoritative.
    fn persist_auto_save_config(&mut self) -> bool {
        let config = *self.auto_save.config();
        let ok = self.store.save_auto_save_config(&config);
        if !ok {
            self.notify(Notice::error("Failed to store auto-save settings"));
        }
        ok
    }

    fn next_position(&self) -> Position {
        let n = self.graph.nodes.len();
        GRID_ORIGIN.offset(
            (n % GRID_COLUMNS) as f64 * GRID_STEP_X,
            (n / GRID_COLUMNS) as f64 * GRID_STEP_Y,
        )
    }

    fn notify(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => log::warn!("{}", notice.message),
            NoticeLevel::Success | NoticeLevel::Info => log::info!("{}", notice.message),
        }
        self.notices.push(notice);
    }
}
