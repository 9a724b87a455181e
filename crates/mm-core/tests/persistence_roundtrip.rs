//! Integration tests: records survive a trip through the gateway on both
//! storage backends.

use mm_core::*;
use pretty_assertions::assert_eq;

fn sample_graph() -> Graph {
    let mut graph = Graph::new();
    graph.nodes.push(Node::new(
        NodeId::intern("1"),
        Position::new(100.0, 100.0),
        NodeData::Topic {
            label: "Forces".into(),
            color: Some("#2563eb".into()),
        },
    ));
    graph.nodes.push(Node::new(
        NodeId::intern("2"),
        Position::new(300.0, 100.0),
        NodeData::Checklist {
            title: "Laws".into(),
            items: vec![
                ChecklistItem {
                    text: "Inertia".into(),
                    done: true,
                },
                ChecklistItem {
                    text: "F = ma".into(),
                    done: false,
                },
            ],
        },
    ));
    graph.nodes.push(Node::new(
        NodeId::intern("3"),
        Position::new(300.0, 300.0),
        NodeData::Quiz {
            question: "Unit of force?".into(),
            options: ["Newton", "Joule", "Watt"]
                .into_iter()
                .map(String::from)
                .collect(),
            answer: Some(0),
        },
    ));
    let mut edge = Edge::new("e1".into(), "1".into(), "2".into());
    edge.apply(&EdgePatch {
        arrow: Some(ArrowKind::End),
        stroke_style: Some(StrokeStyle::Dashed),
        ..Default::default()
    });
    graph.edges.push(edge);
    graph.edges.push(Edge::new("e2".into(), "1".into(), "3".into()));
    graph
}

#[test]
fn memory_backend_roundtrip_is_structural() {
    let graph = sample_graph();
    let mut store = MindMapStore::new(MemoryStore::new());
    assert!(store.save(&MindMapRecord::new("Physics", &graph)));

    let loaded = store.load("Physics").expect("record stored");
    assert_eq!(loaded.name, "Physics");
    assert_eq!(loaded.into_graph(), graph);
}

#[test]
fn file_backend_roundtrip_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let graph = sample_graph();
    {
        let mut store = MindMapStore::new(FileStore::open(dir.path()).unwrap());
        assert!(store.save(&MindMapRecord::new("Physics", &graph)));
        assert!(store.save(&MindMapRecord::new("Chemistry", &Graph::new())));
    }

    let store = MindMapStore::new(FileStore::open(dir.path()).unwrap());
    assert_eq!(
        store.list_names(),
        vec!["Chemistry".to_string(), "Physics".to_string()]
    );
    assert_eq!(store.load("Physics").unwrap().into_graph(), graph);
}

#[test]
fn stored_bucket_is_name_keyed_json() {
    let mut store = MindMapStore::new(MemoryStore::new());
    store.save(&MindMapRecord::new("Physics", &sample_graph()));

    let raw = store
        .backend()
        .get(gateway::MINDMAPS_KEY)
        .unwrap()
        .expect("bucket written");
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["Physics"]["name"], "Physics");
    assert_eq!(value["Physics"]["nodes"][0]["data"]["nodeType"], "topic");
    assert_eq!(value["Physics"]["edges"][0]["markerEnd"]["type"], "arrowClosed");
}
