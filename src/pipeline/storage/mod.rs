// Pipeline storage: document store backends and the persistence gateway

pub mod in_memory;
pub mod json_file;
pub mod persistence;

pub use in_memory::InMemoryDocumentStore;
pub use json_file::JsonFileStore;
pub use persistence::PersistenceGateway;

use crate::app::ports::DocumentStore;
use crate::config::{StorageBackend, StorageConfig};
use std::sync::Arc;

/// Document store selected by configuration.
pub fn build_document_store(config: &StorageConfig) -> Arc<dyn DocumentStore> {
    match config.backend {
        StorageBackend::Memory => Arc::new(InMemoryDocumentStore::new()),
        StorageBackend::File => Arc::new(JsonFileStore::new(config.path.clone())),
    }
}
