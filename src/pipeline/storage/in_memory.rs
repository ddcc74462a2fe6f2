use crate::app::ports::{DocumentFilter, DocumentStore, StoreHealth};
use crate::error::{CollectorError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

type Documents = HashMap<(String, String), Value>;

/// In-memory document store for development/testing
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<Mutex<Documents>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Documents>> {
        self.documents
            .lock()
            .map_err(|_| CollectorError::Storage("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn put(&self, collection: &str, key: &str, value: Value) -> Result<()> {
        let mut documents = self.lock()?;
        documents.insert((collection.to_string(), key.to_string()), value);
        debug!("Stored document {}/{}", collection, key);
        Ok(())
    }

    async fn get_many(&self, collection: &str, filter: &DocumentFilter) -> Result<Vec<Value>> {
        let documents = self.lock()?;
        let mut matched: Vec<(&String, &Value)> = documents
            .iter()
            .filter(|((c, _), doc)| c == collection && filter.matches(doc))
            .map(|((_, key), doc)| (key, doc))
            .collect();
        matched.sort_by(|a, b| a.0.cmp(b.0));
        Ok(matched.into_iter().map(|(_, doc)| doc.clone()).collect())
    }

    async fn health_check(&self) -> Result<StoreHealth> {
        Ok(StoreHealth {
            backend: "memory",
            documents: self.lock()?.len(),
        })
    }
}
