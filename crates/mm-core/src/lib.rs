pub mod export;
pub mod gateway;
pub mod id;
pub mod model;
pub mod record;
pub mod storage;

pub use export::{ExportDocument, ExportFile, export_file, parse_export};
pub use gateway::MindMapStore;
pub use id::{EdgeId, NodeId};
pub use model::*;
pub use record::{AutoSaveConfig, MindMapRecord};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult};
