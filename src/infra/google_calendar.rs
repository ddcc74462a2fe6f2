use crate::app::ports::CalendarProvider;
use crate::calendar::payload::{CalendarEventPayload, CalendarEventRecord};
use crate::error::ProviderError;
use crate::infra::http_client::{check_status, read_json};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<CalendarEventRecord>,
}

/// Google Calendar v3 events resource, authorized with a bearer access token.
pub struct GoogleCalendarClient {
    client: Client,
    endpoint: String,
    calendar_id: String,
    access_token: String,
}

impl GoogleCalendarClient {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        calendar_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            calendar_id: calendar_id.into(),
            access_token: access_token.into(),
        }
    }

    /// Calendar ids usually contain `@`, so both path segments are percent-encoded.
    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(&self.calendar_id)
        )
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(event_id))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.access_token)
    }
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

#[async_trait]
impl CalendarProvider for GoogleCalendarClient {
    async fn insert(&self, event: &CalendarEventPayload) -> Result<String, ProviderError> {
        let response = self
            .authorized(self.client.post(self.events_url()))
            .json(event)
            .send()
            .await?;
        let created: Created = read_json(response).await?;
        Ok(created.id)
    }

    async fn update(&self, event_id: &str, event: &CalendarEventPayload) -> Result<String, ProviderError> {
        let response = self
            .authorized(self.client.put(self.event_url(event_id)))
            .json(event)
            .send()
            .await?;
        let updated: Created = read_json(response).await?;
        Ok(updated.id)
    }

    async fn delete(&self, event_id: &str) -> Result<(), ProviderError> {
        let response = self
            .authorized(self.client.delete(self.event_url(event_id)))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn get(&self, event_id: &str) -> Result<CalendarEventRecord, ProviderError> {
        let response = self
            .authorized(self.client.get(self.event_url(event_id)))
            .send()
            .await?;
        read_json(response).await
    }

    async fn list(&self, time_min: DateTime<Utc>, max_results: u32) -> Result<Vec<CalendarEventRecord>, ProviderError> {
        let time_min = time_min.to_rfc3339_opts(SecondsFormat::Secs, true);
        let max_results = max_results.to_string();
        let response = self
            .authorized(self.client.get(self.events_url()))
            .query(&[
                ("timeMin", time_min.as_str()),
                ("maxResults", max_results.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .send()
            .await?;
        let list: EventList = read_json(response).await?;
        Ok(list.items)
    }
}
