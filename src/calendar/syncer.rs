use crate::app::ports::CalendarProvider;
use crate::calendar::payload::{build_payload, CalendarEventRecord, CalendarSettings};
use crate::calendar::retry::RetryPolicy;
use crate::error::{CollectorError, Result};
use crate::types::ValidatedEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Serialize)]
pub struct CalendarSyncOutcome {
    pub title: String,
    pub date: chrono::NaiveDate,
    pub event_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarSyncReport {
    pub synced: usize,
    pub failed: usize,
    pub outcomes: Vec<CalendarSyncOutcome>,
}

/// Writes validated events into the calendar with bounded retry.
pub struct CalendarSyncer {
    provider: Arc<dyn CalendarProvider>,
    policy: RetryPolicy,
    settings: CalendarSettings,
}

impl CalendarSyncer {
    pub fn new(provider: Arc<dyn CalendarProvider>, policy: RetryPolicy, settings: CalendarSettings) -> Self {
        Self {
            provider,
            policy,
            settings,
        }
    }

    pub fn settings(&self) -> &CalendarSettings {
        &self.settings
    }

    #[instrument(skip(self, event, cancel), fields(title = %event.title, date = %event.date))]
    pub async fn insert(&self, event: &ValidatedEvent, cancel: &CancellationToken) -> Result<String> {
        let payload = build_payload(event, &self.settings);
        let id = self
            .policy
            .run("calendar insert", &event.title, cancel, || self.provider.insert(&payload))
            .await?;
        info!("Created calendar event {}", id);
        Ok(id)
    }

    #[instrument(skip(self, event, cancel))]
    pub async fn update(&self, event_id: &str, event: &ValidatedEvent, cancel: &CancellationToken) -> Result<String> {
        let payload = build_payload(event, &self.settings);
        self.policy
            .run("calendar update", event_id, cancel, || self.provider.update(event_id, &payload))
            .await
    }

    #[instrument(skip(self, cancel))]
    pub async fn delete(&self, event_id: &str, cancel: &CancellationToken) -> Result<()> {
        self.policy
            .run("calendar delete", event_id, cancel, || self.provider.delete(event_id))
            .await
    }

    /// `None` when the provider has no such event.
    pub async fn get(&self, event_id: &str, cancel: &CancellationToken) -> Result<Option<CalendarEventRecord>> {
        match self
            .policy
            .run("calendar get", event_id, cancel, || self.provider.get(event_id))
            .await
        {
            Ok(record) => Ok(Some(record)),
            Err(CollectorError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn list_upcoming(
        &self,
        time_min: DateTime<Utc>,
        max_results: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<CalendarEventRecord>> {
        self.policy
            .run("calendar list", "upcoming", cancel, || self.provider.list(time_min, max_results))
            .await
    }

    /// Inserts one event without an external cancellation source.
    pub async fn sync_to_calendar(&self, event: &ValidatedEvent) -> Result<String> {
        self.insert(event, &CancellationToken::new()).await
    }

    /// Inserts every event, continuing past failures. Stops early only on cancellation.
    pub async fn sync_all(&self, events: &[ValidatedEvent], cancel: &CancellationToken) -> CalendarSyncReport {
        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            if cancel.is_cancelled() {
                warn!("Calendar sync cancelled with {} events left", events.len() - outcomes.len());
                break;
            }
            let (event_id, error) = match self.insert(event, cancel).await {
                Ok(id) => (Some(id), None),
                Err(e) => {
                    warn!("Calendar sync failed for '{}': {}", event.title, e);
                    (None, Some(e.to_string()))
                }
            };
            outcomes.push(CalendarSyncOutcome {
                title: event.title.clone(),
                date: event.date,
                event_id,
                error,
            });
        }

        let synced = outcomes.iter().filter(|o| o.event_id.is_some()).count();
        CalendarSyncReport {
            synced,
            failed: outcomes.len() - synced,
            outcomes,
        }
    }
}
