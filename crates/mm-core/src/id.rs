use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for element IDs — fast comparisons, low memory.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned identifier for nodes and edges of a mind map.
/// Internally a `Spur` index — 4 bytes, Copy, Eq, Hash in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

/// Edges share the node interner; an edge id is just another interned string.
pub type EdgeId = NodeId;

impl NodeId {
    /// Intern a string as a NodeId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a process-unique ID with a kind prefix (e.g. `topic_1`, `edge_7`).
    ///
    /// Unique within this process only. Graphs loaded from storage may already
    /// hold the same string, so callers that need graph-level uniqueness go
    /// through [`crate::model::Graph::fresh_node_id`].
    pub fn with_prefix(prefix: &str) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{prefix}_{n}"))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::intern(s)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeId::intern("forces");
        let b = NodeId::from("forces");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "forces");
        assert_eq!(a.to_string(), "forces");
    }

    #[test]
    fn prefixed_ids_are_unique() {
        let a = NodeId::with_prefix("topic");
        let b = NodeId::with_prefix("topic");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("topic_"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = NodeId::intern("n1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"n1\"");
        let back: NodeId = serde_json::from_str("\"n1\"").unwrap();
        assert_eq!(back, id);
    }
}
