use crate::calendar::payload::{CalendarEventPayload, CalendarEventRecord};
use crate::error::{ProviderError, Result};
use crate::types::SearchHit;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub page_size: u8,
    /// Provider date restriction, e.g. `d30` for the last 30 days.
    pub date_restriction: String,
    pub language: Option<String>,
}

/// Web search. A non-success response must come back as `Err`, not as an empty page.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> std::result::Result<Vec<SearchHit>, ProviderError>;
}

/// Free-form text generation; no structure is guaranteed in the output.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError>;
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn insert(&self, event: &CalendarEventPayload) -> std::result::Result<String, ProviderError>;
    async fn update(
        &self,
        event_id: &str,
        event: &CalendarEventPayload,
    ) -> std::result::Result<String, ProviderError>;
    async fn delete(&self, event_id: &str) -> std::result::Result<(), ProviderError>;
    async fn get(&self, event_id: &str) -> std::result::Result<CalendarEventRecord, ProviderError>;
    async fn list(
        &self,
        time_min: DateTime<Utc>,
        max_results: u32,
    ) -> std::result::Result<Vec<CalendarEventRecord>, ProviderError>;
}

/// Equality constraints on top-level document fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub equals: Vec<(String, Value)>,
}

impl DocumentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.equals
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreHealth {
    pub backend: &'static str,
    pub documents: usize,
}

/// Keyed document storage. Writing an existing key overwrites it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put(&self, collection: &str, key: &str, value: Value) -> Result<()>;
    async fn get_many(&self, collection: &str, filter: &DocumentFilter) -> Result<Vec<Value>>;
    async fn health_check(&self) -> Result<StoreHealth>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_matches_all_constraints() {
        let doc = json!({"subject": "IU", "partition": "default_user", "date": "2025-03-01"});
        assert!(DocumentFilter::new().matches(&doc));
        assert!(DocumentFilter::new().field_eq("subject", "IU").matches(&doc));
        assert!(!DocumentFilter::new()
            .field_eq("subject", "IU")
            .field_eq("partition", "other")
            .matches(&doc));
        assert!(!DocumentFilter::new().field_eq("missing", "x").matches(&doc));
    }
}
