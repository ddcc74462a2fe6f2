use crate::app::ports::{DocumentFilter, DocumentStore};
use crate::config::StorageConfig;
use crate::error::Result;
use crate::idempotency::{compute_document_key, compute_event_key};
use crate::types::{PersistResult, ValidatedEvent};
use chrono::Utc;
use metrics::counter;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Writes validated events to the document store under deterministic keys.
///
/// Keys are scoped by partition; the unscoped event key is kept in the document body.
#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn DocumentStore>,
    collection: String,
    partition: String,
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>, partition: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            partition: partition.into(),
        }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &StorageConfig) -> Self {
        Self::new(store, config.collection.clone(), config.partition.clone())
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    fn document(&self, event: &ValidatedEvent, subject: &str, event_key: &str) -> Result<Value> {
        let mut document = serde_json::to_value(event)?;
        let now = Utc::now().to_rfc3339();
        if let Value::Object(fields) = &mut document {
            fields.insert("subject".to_string(), json!(subject));
            fields.insert("partition".to_string(), json!(self.partition));
            fields.insert("event_key".to_string(), json!(event_key));
            fields.insert("created_at".to_string(), json!(now));
            fields.insert("updated_at".to_string(), json!(now));
        }
        Ok(document)
    }

    /// Best effort: an event that fails to store is logged and counted, never fatal.
    #[instrument(skip(self, events), fields(events = events.len()))]
    pub async fn persist(&self, events: &[ValidatedEvent], subject: &str) -> PersistResult {
        let mut saved_count = 0;
        let mut failed_count = 0;

        for event in events {
            let event_key = compute_event_key(subject, event.date, &event.title);
            let key = compute_document_key(&self.partition, &event_key);
            let outcome = match self.document(event, subject, &event_key) {
                Ok(document) => self.store.put(&self.collection, &key, document).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => saved_count += 1,
                Err(e) => {
                    warn!("Failed to persist '{}' ({}): {}", event.title, event.date, e);
                    failed_count += 1;
                }
            }
        }

        counter!("schedule_feed_persist_saved_total").increment(saved_count as u64);
        counter!("schedule_feed_persist_failed_total").increment(failed_count as u64);
        info!("Persisted {} events for {} ({} failed)", saved_count, subject, failed_count);

        PersistResult {
            success: failed_count == 0,
            saved_count,
            failed_count,
            message: format!("saved {saved_count} events for {subject}, {failed_count} failed"),
        }
    }

    /// Stored documents for one subject within this gateway's partition.
    pub async fn events_for(&self, subject: &str) -> Result<Vec<Value>> {
        let filter = DocumentFilter::new()
            .field_eq("subject", subject)
            .field_eq("partition", self.partition.as_str());
        self.store.get_many(&self.collection, &filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::StoreHealth;
    use crate::error::CollectorError;
    use crate::pipeline::storage::InMemoryDocumentStore;
    use crate::types::{EventType, Reliability};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn event(title: &str, day: u32) -> ValidatedEvent {
        ValidatedEvent {
            date: NaiveDate::from_ymd_opt(2025, 7, day).unwrap(),
            time: "18:00".into(),
            title: title.into(),
            artist: "IU".into(),
            subject: "IU".into(),
            event_type: EventType::Concert,
            location: "Tokyo Dome".into(),
            source: "https://example.com".into(),
            confidence: 0.9,
            reliability: Reliability::High,
            genre: None,
            validated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn persists_under_deterministic_keys() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let gateway = PersistenceGateway::new(store.clone(), "schedules", "default_user");

        let events = vec![event("Arena", 1), event("Hall", 2)];
        let first = gateway.persist(&events, "IU").await;
        let second = gateway.persist(&events, "IU").await;

        assert_eq!(first.saved_count, 2);
        assert!(second.success);
        assert_eq!(store.health_check().await.unwrap().documents, 2);

        let stored = gateway.events_for("IU").await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0]["partition"], "default_user");
        assert_eq!(stored[0]["subject"], "IU");
        assert!(stored[0]["created_at"].is_string());
        assert!(gateway.events_for("BTS").await.unwrap().is_empty());

        let arena_key = compute_event_key("IU", NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(), "Arena");
        assert!(stored.iter().any(|doc| doc["event_key"] == arena_key.as_str()));
    }

    #[tokio::test]
    async fn partitions_sharing_a_store_keep_their_own_copy() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let alice = PersistenceGateway::new(store.clone(), "schedules", "alice");
        let bob = PersistenceGateway::new(store.clone(), "schedules", "bob");

        alice.persist(&[event("Arena", 1)], "IU").await;
        bob.persist(&[event("Arena", 1)], "IU").await;

        assert_eq!(store.health_check().await.unwrap().documents, 2);
        let for_alice = alice.events_for("IU").await.unwrap();
        let for_bob = bob.events_for("IU").await.unwrap();
        assert_eq!(for_alice.len(), 1);
        assert_eq!(for_bob.len(), 1);
        assert_eq!(for_alice[0]["partition"], "alice");
        assert_eq!(for_alice[0]["event_key"], for_bob[0]["event_key"]);
    }

    struct FlakyStore {
        inner: InMemoryDocumentStore,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn put(&self, collection: &str, key: &str, value: Value) -> Result<()> {
            if value["title"] == "Broken" {
                return Err(CollectorError::Storage("disk full".into()));
            }
            self.inner.put(collection, key, value).await
        }

        async fn get_many(&self, collection: &str, filter: &DocumentFilter) -> Result<Vec<Value>> {
            self.inner.get_many(collection, filter).await
        }

        async fn health_check(&self) -> Result<StoreHealth> {
            self.inner.health_check().await
        }
    }

    #[tokio::test]
    async fn failed_put_is_counted_and_skipped() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryDocumentStore::new(),
        });
        let gateway = PersistenceGateway::new(store, "schedules", "default_user");

        let result = gateway
            .persist(&[event("Arena", 1), event("Broken", 2), event("Hall", 3)], "IU")
            .await;

        assert!(!result.success);
        assert_eq!(result.saved_count, 2);
        assert_eq!(result.failed_count, 1);
    }
}
