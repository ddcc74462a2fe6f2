#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use schedule_feed::app::ports::{CalendarProvider, SearchProvider, SearchRequest, TextGenerator};
use schedule_feed::calendar::{CalendarEventPayload, CalendarEventRecord};
use schedule_feed::error::ProviderError;
use schedule_feed::pipeline::storage::InMemoryDocumentStore;
use schedule_feed::types::SearchHit;
use schedule_feed::{AppContext, Config};
use schedule_feed::context::Ports;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub type Reply<T> = Result<T, ProviderError>;

/// Today's date where collections run (+09:00).
pub fn collection_today() -> NaiveDate {
    let offset = FixedOffset::east_opt(9 * 3600).unwrap();
    Utc::now().with_timezone(&offset).date_naive()
}

pub fn days_from_today(days: i64) -> String {
    (collection_today() + Duration::days(days)).to_string()
}

pub fn hit(url: &str) -> SearchHit {
    SearchHit {
        title: format!("Result {url}"),
        url: url.to_string(),
        snippet: "upcoming show".to_string(),
    }
}

/// Returns the same hits for every query of the subjects it knows.
#[derive(Default)]
pub struct FakeSearch {
    pub hits: HashMap<String, Vec<SearchHit>>,
    pub calls: AtomicUsize,
}

impl FakeSearch {
    pub fn with(mut self, subject: &str, hits: Vec<SearchHit>) -> Self {
        self.hits.insert(subject.to_string(), hits);
        self
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, request: &SearchRequest) -> Reply<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let subject = request.query.split(' ').next().unwrap_or_default();
        Ok(self.hits.get(subject).cloned().unwrap_or_default())
    }
}

/// What the fake model does for a subject.
#[derive(Clone)]
pub enum Script {
    Reply(String),
    Fail(u16),
    Panic,
    Stall(std::time::Duration),
}

#[derive(Default)]
pub struct FakeGenerator {
    pub scripts: HashMap<String, Script>,
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub delay: Option<std::time::Duration>,
}

impl FakeGenerator {
    pub fn with(mut self, subject: &str, script: Script) -> Self {
        self.scripts.insert(subject.to_string(), script);
        self
    }

    fn script_for(&self, prompt: &str) -> Script {
        self.scripts
            .iter()
            .find(|(subject, _)| prompt.contains(&format!("information for {subject}.")))
            .map(|(_, script)| script.clone())
            .unwrap_or_else(|| Script::Reply(r#"{"events": []}"#.to_string()))
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Reply<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.script_for(prompt) {
            Script::Reply(text) => Ok(text),
            Script::Fail(status) => Err(ProviderError::from_status(status, "unavailable")),
            Script::Panic => panic!("model client crashed"),
            Script::Stall(duration) => {
                tokio::time::sleep(duration).await;
                Ok(r#"{"events": []}"#.to_string())
            }
        }
    }
}

/// Calendar whose replies are scripted per operation; records every call.
#[derive(Default)]
pub struct FakeCalendar {
    pub insert_replies: Mutex<Vec<Reply<String>>>,
    pub update_replies: Mutex<Vec<Reply<String>>>,
    pub delete_replies: Mutex<Vec<Reply<()>>>,
    pub calls: Mutex<Vec<String>>,
    /// When each call arrived, on the tokio clock.
    pub call_times: Mutex<Vec<tokio::time::Instant>>,
    pub payloads: Mutex<Vec<CalendarEventPayload>>,
}

impl FakeCalendar {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
        self.call_times.lock().unwrap().push(tokio::time::Instant::now());
    }

    /// Time between consecutive calls.
    pub fn gaps(&self) -> Vec<std::time::Duration> {
        let times = self.call_times.lock().unwrap();
        times.windows(2).map(|pair| pair[1] - pair[0]).collect()
    }
}

fn next<T>(replies: &Mutex<Vec<Reply<T>>>, fallback: Reply<T>) -> Reply<T> {
    let mut replies = replies.lock().unwrap();
    if replies.is_empty() {
        fallback
    } else {
        replies.remove(0)
    }
}

#[async_trait]
impl CalendarProvider for FakeCalendar {
    async fn insert(&self, event: &CalendarEventPayload) -> Reply<String> {
        self.record("insert");
        self.payloads.lock().unwrap().push(event.clone());
        next(&self.insert_replies, Ok("evt-new".into()))
    }

    async fn update(&self, event_id: &str, event: &CalendarEventPayload) -> Reply<String> {
        self.record(format!("update {event_id}"));
        self.payloads.lock().unwrap().push(event.clone());
        next(&self.update_replies, Ok(event_id.to_string()))
    }

    async fn delete(&self, event_id: &str) -> Reply<()> {
        self.record(format!("delete {event_id}"));
        next(&self.delete_replies, Ok(()))
    }

    async fn get(&self, event_id: &str) -> Reply<CalendarEventRecord> {
        self.record(format!("get {event_id}"));
        Err(ProviderError::NotFound)
    }

    async fn list(&self, _time_min: DateTime<Utc>, _max_results: u32) -> Reply<Vec<CalendarEventRecord>> {
        self.record("list");
        Ok(vec![CalendarEventRecord {
            id: "evt-1".into(),
            summary: Some("Arena".into()),
            ..Default::default()
        }])
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.search.inter_query_delay_ms = 0;
    config
}

pub fn context(
    config: Config,
    search: Arc<FakeSearch>,
    generator: Arc<FakeGenerator>,
    calendar: Option<Arc<FakeCalendar>>,
) -> AppContext {
    AppContext::with_ports(
        config,
        Ports {
            search,
            generator,
            calendar: calendar.map(|c| c as Arc<dyn CalendarProvider>),
            store: Arc::new(InMemoryDocumentStore::new()),
        },
    )
    .unwrap()
}
