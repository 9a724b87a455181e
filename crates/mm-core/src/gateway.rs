//! Persistence gateway: named mind-map records, auto-save config and the
//! single-slot node clipboard on top of a [`KeyValueStore`].
//!
//! Every failure stops here. Storage and serialization errors are logged and
//! surface to callers as `false` / `None`; malformed stored JSON reads as
//! "nothing stored" but is never overwritten by a later write.

use crate::model::Node;
use crate::record::{AutoSaveConfig, MindMapRecord};
use crate::storage::{KeyValueStore, StorageResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

pub const MINDMAPS_KEY: &str = "mindmaps";
pub const AUTO_SAVE_KEY: &str = "autoSaveConfig";
pub const CLIPBOARD_KEY: &str = "copiedNode";

/// Records are kept as raw JSON so one bad entry cannot take the others
/// down with it.
type Bucket = BTreeMap<String, Value>;

pub struct MindMapStore<S> {
    backend: S,
}

impl<S: KeyValueStore> MindMapStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    // ─── Records ─────────────────────────────────────────────────────────

    /// Upsert `record` under its name. Returns `false` if the write failed
    /// or the stored bucket could not be read; an unreadable bucket is never
    /// overwritten.
    pub fn save(&mut self, record: &MindMapRecord) -> bool {
        let result = self.update_bucket(|bucket| {
            bucket.insert(record.name.clone(), serde_json::to_value(record)?);
            Ok(true)
        });
        match result {
            Ok(_) => {
                log::debug!(
                    "saved mind map `{}` ({} nodes, {} edges)",
                    record.name,
                    record.nodes.len(),
                    record.edges.len()
                );
                true
            }
            Err(e) => {
                log::error!("failed to save mind map `{}`: {e}", record.name);
                false
            }
        }
    }

    /// The record stored under `name`. An entry that no longer parses is
    /// skipped with a warning and reads as missing.
    pub fn load(&self, name: &str) -> Option<MindMapRecord> {
        let raw = self.bucket_for_reading().remove(name)?;
        parse_record(name, raw)
    }

    /// Whether `name` is taken, including by an entry that fails to parse.
    pub fn contains(&self, name: &str) -> bool {
        self.bucket_for_reading().contains_key(name)
    }

    /// Names of all loadable records, sorted.
    pub fn list_names(&self) -> Vec<String> {
        self.bucket_for_reading()
            .into_iter()
            .filter_map(|(name, raw)| parse_record(&name, raw).map(|_| name))
            .collect()
    }

    /// Remove a record. Returns whether one existed and the removal was
    /// written.
    pub fn delete(&mut self, name: &str) -> bool {
        match self.update_bucket(|bucket| Ok(bucket.remove(name).is_some())) {
            Ok(true) => {
                log::debug!("deleted mind map `{name}`");
                true
            }
            Ok(false) => false,
            Err(e) => {
                log::error!("failed to delete mind map `{name}`: {e}");
                false
            }
        }
    }

    /// The raw bucket. Absent reads as empty; an I/O failure or a value
    /// that is not a JSON object is an error.
    fn read_bucket(&self) -> StorageResult<Bucket> {
        match self.backend.get(MINDMAPS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Bucket::new()),
        }
    }

    fn bucket_for_reading(&self) -> Bucket {
        self.read_bucket()
            .inspect_err(|e| log::warn!("ignoring unreadable `{MINDMAPS_KEY}` data: {e}"))
            .unwrap_or_default()
    }

    /// Read-modify-write of the bucket. Entries the edit does not touch are
    /// written back verbatim. Nothing is written if `edit` reports no change.
    fn update_bucket(
        &mut self,
        edit: impl FnOnce(&mut Bucket) -> StorageResult<bool>,
    ) -> StorageResult<bool> {
        let mut bucket = self.read_bucket()?;
        let changed = edit(&mut bucket)?;
        if changed {
            self.write_json(MINDMAPS_KEY, &bucket)?;
        }
        Ok(changed)
    }

    // ─── Auto-save config ────────────────────────────────────────────────

    /// The stored config, or defaults when absent or unreadable.
    pub fn load_auto_save_config(&self) -> AutoSaveConfig {
        self.read_json(AUTO_SAVE_KEY).unwrap_or_default()
    }

    pub fn save_auto_save_config(&mut self, config: &AutoSaveConfig) -> bool {
        self.write_json(AUTO_SAVE_KEY, config)
            .inspect_err(|e| log::error!("failed to persist auto-save config: {e}"))
            .is_ok()
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    /// Overwrite the single clipboard slot with `node`.
    pub fn set_clipboard(&mut self, node: &Node) -> bool {
        self.write_json(CLIPBOARD_KEY, node)
            .inspect_err(|e| log::error!("failed to copy node {}: {e}", node.id))
            .is_ok()
    }

    pub fn clipboard(&self) -> Option<Node> {
        self.read_json(CLIPBOARD_KEY)
    }

    // ─── JSON helpers ────────────────────────────────────────────────────

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                log::error!("failed to read `{key}`: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("ignoring malformed `{key}` data: {e}");
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(key, &raw)
    }
}

fn parse_record(name: &str, raw: Value) -> Option<MindMapRecord> {
    serde_json::from_value(raw)
        .inspect_err(|e| log::warn!("skipping unreadable mind map `{name}`: {e}"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use crate::model::{Graph, NodeData, Position};
    use crate::storage::{MemoryStore, StorageError};
    use pretty_assertions::assert_eq;

    fn record(name: &str, label: &str) -> MindMapRecord {
        let mut graph = Graph::new();
        graph.nodes.push(Node::new(
            NodeId::intern("1"),
            Position::default(),
            NodeData::Topic {
                label: label.into(),
                color: None,
            },
        ));
        MindMapRecord::new(name, &graph)
    }

    #[test]
    fn save_overwrites_by_name() {
        let mut store = MindMapStore::new(MemoryStore::new());
        assert!(store.save(&record("A", "first")));
        assert!(store.save(&record("A", "second")));
        assert!(store.save(&record("B", "other")));
        assert_eq!(store.list_names(), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(store.load("A"), Some(record("A", "second")));
    }

    #[test]
    fn load_missing_is_none() {
        let store = MindMapStore::new(MemoryStore::new());
        assert_eq!(store.load("nope"), None);
        assert!(!store.contains("nope"));
    }

    #[test]
    fn delete_is_idempotent() {
        let mut store = MindMapStore::new(MemoryStore::new());
        store.save(&record("A", "x"));
        assert!(store.delete("A"));
        assert!(!store.delete("A"));
        assert!(!store.delete("never"));
        assert!(store.list_names().is_empty());
    }

    #[test]
    fn malformed_bucket_reads_as_empty() {
        let mut backend = MemoryStore::new();
        backend.set(MINDMAPS_KEY, "{ not json").unwrap();
        backend.set(AUTO_SAVE_KEY, "enabled=yes").unwrap();
        let store = MindMapStore::new(backend);
        assert!(store.list_names().is_empty());
        assert_eq!(store.load_auto_save_config(), AutoSaveConfig::default());
    }

    /// A bucket holding one good record and one written by a newer build.
    fn mixed_bucket() -> MemoryStore {
        let mut backend = MemoryStore::new();
        let good = serde_json::to_value(record("Good", "kept")).unwrap();
        let bucket = serde_json::json!({
            "Good": good,
            "Legacy": {
                "name": "Legacy",
                "nodes": [{ "id": "9", "data": { "nodeType": "mermaid" } }],
                "edges": []
            }
        });
        backend.set(MINDMAPS_KEY, &bucket.to_string()).unwrap();
        backend
    }

    #[test]
    fn unreadable_entry_does_not_hide_the_rest() {
        let store = MindMapStore::new(mixed_bucket());
        assert_eq!(store.load("Good"), Some(record("Good", "kept")));
        assert_eq!(store.load("Legacy"), None);
        assert_eq!(store.list_names(), vec!["Good".to_string()]);
        assert!(store.contains("Legacy"));
    }

    #[test]
    fn writes_keep_unreadable_entries() {
        let mut store = MindMapStore::new(mixed_bucket());
        assert!(store.save(&record("New", "fresh")));
        assert!(store.delete("Good"));

        assert_eq!(store.list_names(), vec!["New".to_string()]);
        let raw = store.backend().get(MINDMAPS_KEY).unwrap().unwrap();
        let bucket: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(bucket["Legacy"]["nodes"][0]["data"]["nodeType"], "mermaid");
    }

    #[test]
    fn malformed_bucket_is_not_overwritten() {
        let mut backend = MemoryStore::new();
        backend.set(MINDMAPS_KEY, "{ not json").unwrap();
        let mut store = MindMapStore::new(backend);
        assert!(!store.save(&record("A", "x")));
        assert!(!store.delete("A"));
        assert_eq!(
            store.backend().get(MINDMAPS_KEY).unwrap().as_deref(),
            Some("{ not json")
        );
    }

    /// Backend whose reads fail while writes still go through.
    struct FailingReads(MemoryStore);

    impl KeyValueStore for FailingReads {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Io(std::io::Error::other("disk unavailable")))
        }
        fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
            self.0.set(key, value)
        }
        fn remove(&mut self, key: &str) -> StorageResult<()> {
            self.0.remove(key)
        }
    }

    #[test]
    fn read_failure_refuses_to_write() {
        let mut inner = MemoryStore::new();
        let existing = serde_json::json!({ "Good": record("Good", "kept") });
        inner.set(MINDMAPS_KEY, &existing.to_string()).unwrap();
        let mut store = MindMapStore::new(FailingReads(inner));

        assert!(!store.save(&record("New", "fresh")));
        assert!(!store.delete("Good"));
        assert_eq!(store.load("Good"), None);
        let raw = store.backend().0.get(MINDMAPS_KEY).unwrap().unwrap();
        assert_eq!(raw, existing.to_string());
    }

    #[test]
    fn quota_failure_is_reported_as_false() {
        let mut store = MindMapStore::new(MemoryStore::with_quota(16));
        assert!(!store.save(&record("Too big to fit", "label")));
        assert_eq!(store.load("Too big to fit"), None);
    }

    #[test]
    fn clipboard_holds_one_node() {
        let mut store = MindMapStore::new(MemoryStore::new());
        assert_eq!(store.clipboard(), None);
        let first = record("A", "one").nodes.remove(0);
        let mut second = first.clone();
        second.id = NodeId::intern("2");
        assert!(store.set_clipboard(&first));
        assert!(store.set_clipboard(&second));
        assert_eq!(store.clipboard(), Some(second));
    }

    #[test]
    fn auto_save_config_roundtrip() {
        let mut store = MindMapStore::new(MemoryStore::new());
        let cfg = AutoSaveConfig {
            enabled: true,
            interval: 10_000,
            last_save_time: 7,
        };
        assert!(store.save_auto_save_config(&cfg));
        assert_eq!(store.load_auto_save_config(), cfg);
    }
}
