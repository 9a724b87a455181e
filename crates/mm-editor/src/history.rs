//! Undo/Redo snapshot stack.
//!
//! Every observed change to the live graph is recorded as a full deep copy.
//! `past` holds every visited state *including the current one*, so undo
//! drops the top of `past` (the state being left) and restores the entry
//! beneath it; redo moves the top of `future` back onto `past`.
//!
//! Undo and redo hand a snapshot back to the caller, which writes it into
//! the live graph. That write is itself a graph change and will be observed;
//! a single-shot suppression flag makes the next [`History::record`] swallow
//! it instead of recording it as a new user action.

use mm_core::model::{Edge, Graph, Node};
use std::collections::VecDeque;

/// Default bound on `past`.
pub const MAX_HISTORY_LENGTH: usize = 50;

/// An immutable copy of the whole graph at one point in time.
///
/// Fields are private: once a snapshot is on a stack nothing can mutate it.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSnapshot {
    graph: Graph,
    timestamp: u64,
}

impl GraphSnapshot {
    pub fn capture(graph: &Graph, timestamp: u64) -> Self {
        Self {
            graph: graph.clone(),
            timestamp,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.graph.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.graph.edges
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Epoch milliseconds at capture time.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }
}

/// Bounded past/future snapshot stacks for one mind-map session.
#[derive(Debug)]
pub struct History {
    past: VecDeque<GraphSnapshot>,
    future: Vec<GraphSnapshot>,
    max_depth: usize,
    /// Set by undo/redo; consumed by the next `record`.
    suppress_next: bool,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_HISTORY_LENGTH)
    }
}

impl History {
    /// `max_depth` is clamped to at least 1 so the current state always fits.
    pub fn new(max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        Self {
            past: VecDeque::with_capacity(max_depth),
            future: Vec::new(),
            max_depth,
            suppress_next: false,
        }
    }

    /// Record an observed graph state.
    ///
    /// Returns `false` when nothing was pushed: the call was the echo of an
    /// undo/redo write-back, or the graph equals the current top of `past`.
    pub fn record(&mut self, graph: &Graph, now: u64) -> bool {
        if self.suppress_next {
            self.suppress_next = false;
            log::trace!("history: suppressed replay echo");
            return false;
        }
        if self.past.back().is_some_and(|top| top.graph == *graph) {
            return false;
        }

        self.past.push_back(GraphSnapshot::capture(graph, now));
        self.future.clear();
        while self.past.len() > self.max_depth {
            self.past.pop_front();
            log::trace!("history: evicted oldest snapshot");
        }
        log::debug!("history: recorded state #{}", self.past.len());
        true
    }

    /// Step back one state. `current` is the live graph, kept for redo.
    pub fn undo(&mut self, current: &Graph, now: u64) -> Option<GraphSnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.past.pop_back();
        self.future.push(GraphSnapshot::capture(current, now));
        self.suppress_next = true;
        let restored = self.past.back().cloned();
        log::debug!(
            "history: undo (past={}, future={})",
            self.past.len(),
            self.future.len()
        );
        restored
    }

    /// Step forward one state previously undone. The live graph needs no
    /// capture here: it is already the top of `past`.
    pub fn redo(&mut self) -> Option<GraphSnapshot> {
        let next = self.future.pop()?;
        self.past.push_back(next.clone());
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        self.suppress_next = true;
        log::debug!(
            "history: redo (past={}, future={})",
            self.past.len(),
            self.future.len()
        );
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        self.past.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Forget everything; used when another mind map is opened.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.suppress_next = false;
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The snapshot of the current state, if any has been recorded.
    pub fn current(&self) -> Option<&GraphSnapshot> {
        self.past.back()
    }
}
