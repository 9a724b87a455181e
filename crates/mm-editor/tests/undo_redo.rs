//! Integration tests: snapshot history driven through the session façade.
//!
//! Verifies that façade mutations land in history, that undo/redo restore
//! whole graphs, and that the write-back of a restored state is never
//! recorded as a new action.

use mm_core::{MemoryStore, MindMapStore, NodeData, NodeKind};
use mm_editor::{ManualClock, Session, SessionOptions};
use pretty_assertions::assert_eq;
use serde_json::json;

fn make_session() -> Session<MemoryStore> {
    let mut session = Session::new(
        MindMapStore::new(MemoryStore::new()),
        ManualClock::new(1_000),
        SessionOptions::default(),
    );
    assert!(session.create_new_mind_map("History"));
    session.take_notices();
    session
}

fn labels(session: &Session<MemoryStore>) -> Vec<String> {
    session
        .graph()
        .nodes
        .iter()
        .map(|n| n.data.caption().to_string())
        .collect()
}

// ─── Basic undo/redo ────────────────────────────────────────────────────

#[test]
fn undo_restores_previous_state() {
    let mut session = make_session();
    let id = session
        .add_node(NodeKind::Topic, Some(&json!({ "label": "Forces" })))
        .unwrap();
    assert!(session.update_node_data(id, &json!({ "label": "Gravity" })));
    assert_eq!(labels(&session), vec!["Gravity"]);

    assert!(session.undo());
    assert_eq!(labels(&session), vec!["Forces"]);

    assert!(session.undo());
    assert!(session.graph().nodes.is_empty());
    assert!(!session.can_undo());
}

#[test]
fn redo_reapplies_undone_action() {
    let mut session = make_session();
    session.add_node(NodeKind::Note, Some(&json!({ "text": "draft" })));

    assert!(session.undo());
    assert!(session.graph().nodes.is_empty());
    assert!(session.redo());
    assert_eq!(labels(&session), vec!["draft"]);
    assert!(!session.can_redo());
}

// ─── Multiple operations ────────────────────────────────────────────────

#[test]
fn three_edits_undo_twice_redo_once() {
    let mut session = make_session();
    session.add_node(NodeKind::Topic, Some(&json!({ "label": "one" })));
    session.add_node(NodeKind::Topic, Some(&json!({ "label": "two" })));
    let after_second = session.graph().clone();
    session.add_node(NodeKind::Topic, Some(&json!({ "label": "three" })));

    assert!(session.undo());
    assert!(session.undo());
    assert!(session.can_redo());
    assert!(session.redo());
    assert_eq!(session.graph(), &after_second);
}

#[test]
fn undo_all_then_redo_all_is_inverse() {
    let mut session = make_session();
    let mut states = vec![session.graph().clone()];
    let a = session.add_node(NodeKind::Topic, None).unwrap();
    states.push(session.graph().clone());
    let b = session.add_node(NodeKind::Flashcard, None).unwrap();
    states.push(session.graph().clone());
    session.connect_edge(a, b).unwrap();
    states.push(session.graph().clone());
    session.delete_node(a);
    states.push(session.graph().clone());

    for expected in states.iter().rev().skip(1) {
        assert!(session.undo());
        assert_eq!(session.graph(), expected);
    }
    assert!(!session.undo());

    for expected in states.iter().skip(1) {
        assert!(session.redo());
        assert_eq!(session.graph(), expected);
    }
    assert!(!session.redo());
}

// ─── Redo cleared on new action ─────────────────────────────────────────

#[test]
fn new_action_clears_redo_stack() {
    let mut session = make_session();
    session.add_node(NodeKind::Topic, None);
    session.undo();
    assert!(session.can_redo(), "should be able to redo after undo");

    session.add_node(NodeKind::Checklist, None);
    assert!(
        !session.can_redo(),
        "redo stack should be cleared after new action"
    );
}

// ─── Write-back is not re-recorded ──────────────────────────────────────

#[test]
fn undo_does_not_grow_history() {
    let mut session = make_session();
    session.add_node(NodeKind::Topic, None);
    session.add_node(NodeKind::Topic, None);
    let past = session.history().past_len();

    session.undo();
    assert_eq!(session.history().past_len(), past - 1);
    session.redo();
    assert_eq!(session.history().past_len(), past);
}

#[test]
fn history_bound_is_respected() {
    let mut session = Session::new(
        MindMapStore::new(MemoryStore::new()),
        ManualClock::new(0),
        SessionOptions {
            max_history: 4,
            ..Default::default()
        },
    );
    for _ in 0..10 {
        session.add_node(NodeKind::Note, None);
    }
    assert_eq!(session.history().past_len(), 4);

    let mut undos = 0;
    while session.undo() {
        undos += 1;
    }
    assert_eq!(undos, 3);
    assert_eq!(session.graph().nodes.len(), 7);
}

// ─── History does not cross mind maps ───────────────────────────────────

#[test]
fn loading_another_map_clears_history() {
    let mut session = make_session();
    session.add_node(NodeKind::Topic, None);
    session.save_current_mind_map();
    session.create_new_mind_map("Other");
    assert!(!session.can_undo());
    assert!(!session.can_redo());

    session.add_node(NodeKind::Table, None);
    assert!(session.load_existing_mind_map("History"));
    assert!(!session.can_undo());
    assert_eq!(session.graph().nodes.len(), 1);
}

// ─── Empty stack edge cases ─────────────────────────────────────────────

#[test]
fn undo_redo_on_fresh_session_are_noops() {
    let mut session = make_session();
    assert!(!session.undo());
    assert!(!session.redo());
    assert!(session.take_notices().is_empty());
}

#[test]
fn copy_is_not_a_history_entry() {
    let mut session = make_session();
    let id = session.add_node(NodeKind::Quiz, None).unwrap();
    let past = session.history().past_len();
    assert!(session.copy_node(id));
    assert_eq!(session.history().past_len(), past);
    assert!(matches!(
        session.graph().nodes[0].data,
        NodeData::Quiz { .. }
    ));
}
