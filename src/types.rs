use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// The query variants issued for every subject, in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryVariant {
    ConcertTour,
    ScheduleEvent,
    Ticket,
    FanMeeting,
}

impl QueryVariant {
    pub const ALL: [QueryVariant; 4] = [
        QueryVariant::ConcertTour,
        QueryVariant::ScheduleEvent,
        QueryVariant::Ticket,
        QueryVariant::FanMeeting,
    ];
}

/// One rendered search query for a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub subject: String,
    pub variant: QueryVariant,
    pub horizon_days: u32,
    pub text: String,
}

/// A single hit as returned by the search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// A search hit tagged with the query that produced it. Identity is the url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub query: String,
}

impl SearchResult {
    pub fn from_hit(hit: SearchHit, query: &str) -> Self {
        Self {
            title: hit.title,
            url: hit.url,
            snippet: hit.snippet,
            query: query.to_string(),
        }
    }
}

/// An event as the generative model described it. Nothing here is trusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub artist: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: Option<String>,
    #[serde(default)]
    pub confidence: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reliability: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub genre: Option<String>,
}

/// Accepts strings, numbers and booleans as text; anything else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Closed vocabulary of appearance types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    Concert,
    Release,
    TvAppearance,
    RadioAppearance,
    Event,
    FanMeeting,
    Other,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Concert => "concert",
            EventType::Release => "release",
            EventType::TvAppearance => "tv-appearance",
            EventType::RadioAppearance => "radio-appearance",
            EventType::Event => "event",
            EventType::FanMeeting => "fan-meeting",
            EventType::Other => "other",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse trust label assigned during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reliability {
    High,
    Medium,
    Low,
}

impl Reliability {
    /// Parses the labels the model is asked to emit, plus their Japanese forms.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "high" | "高" => Some(Reliability::High),
            "medium" | "mid" | "中" => Some(Reliability::Medium),
            "low" | "低" => Some(Reliability::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Reliability::High => "high",
            Reliability::Medium => "medium",
            Reliability::Low => "low",
        }
    }
}

impl fmt::Display for Reliability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event that passed validation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedEvent {
    pub date: NaiveDate,
    /// "HH:MM" or empty when the time is unknown.
    pub time: String,
    pub title: String,
    pub artist: String,
    /// The subject the event was collected for. Keys are derived from it, never from `artist`.
    #[serde(default)]
    pub subject: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub location: String,
    pub source: String,
    pub confidence: f64,
    pub reliability: Reliability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    pub validated_at: DateTime<Utc>,
}

impl ValidatedEvent {
    /// Start of day when no time was given.
    pub fn start_time(&self) -> NaiveTime {
        NaiveTime::parse_from_str(&self.time, "%H:%M").unwrap_or(NaiveTime::MIN)
    }

    pub fn sort_key(&self) -> (NaiveDate, &str) {
        let time = if self.time.is_empty() { "00:00" } else { self.time.as_str() };
        (self.date, time)
    }
}

/// Outcome of one end-to-end collection for a single subject.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionRun {
    pub run_id: Uuid,
    pub subject: String,
    pub horizon_days: u32,
    pub collected_at: DateTime<Utc>,
    pub search_results: usize,
    pub events: Vec<ValidatedEvent>,
    pub success: bool,
    pub message: String,
}

impl CollectionRun {
    pub fn succeeded(
        subject: &str,
        horizon_days: u32,
        search_results: usize,
        events: Vec<ValidatedEvent>,
    ) -> Self {
        let message = format!("collected {} events for {}", events.len(), subject);
        Self {
            run_id: Uuid::new_v4(),
            subject: subject.to_string(),
            horizon_days,
            collected_at: Utc::now(),
            search_results,
            events,
            success: true,
            message,
        }
    }

    pub fn failed(subject: &str, horizon_days: u32, message: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            subject: subject.to_string(),
            horizon_days,
            collected_at: Utc::now(),
            search_results: 0,
            events: Vec::new(),
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectFailure {
    pub subject: String,
    pub message: String,
}

/// Aggregate of a concurrent collection over several subjects.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRun {
    pub successful: Vec<CollectionRun>,
    pub failed: Vec<SubjectFailure>,
    pub total_events: usize,
    pub collected_at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistResult {
    pub success: bool,
    pub saved_count: usize,
    pub failed_count: usize,
    pub message: String,
}
