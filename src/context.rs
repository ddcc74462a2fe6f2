use crate::app::ports::{CalendarProvider, DocumentStore, SearchProvider, StoreHealth, TextGenerator};
use crate::calendar::{CalendarSettings, CalendarSyncer, RetryPolicy};
use crate::config::{
    require, Config, GEMINI_API_KEY_ENV, GOOGLE_API_KEY_ENV, GOOGLE_CALENDAR_ACCESS_TOKEN_ENV,
    GOOGLE_CALENDAR_ID_ENV, GOOGLE_SEARCH_ENGINE_ID_ENV,
};
use crate::error::{CollectorError, Result};
use crate::infra::http_client::build_client;
use crate::infra::{GeminiClient, GoogleCalendarClient, GoogleSearchClient};
use crate::pipeline::ingestion::{SearchAggregator, SearchSettings};
use crate::pipeline::processing::{ExtractionEngine, Validator};
use crate::pipeline::storage::{build_document_store, PersistenceGateway};
use crate::pipeline::CollectionOrchestrator;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The provider ports an application context is wired from.
pub struct Ports {
    pub search: Arc<dyn SearchProvider>,
    pub generator: Arc<dyn TextGenerator>,
    pub calendar: Option<Arc<dyn CalendarProvider>>,
    pub store: Arc<dyn DocumentStore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub credentials: BTreeMap<&'static str, bool>,
    pub calendar_configured: bool,
    pub storage: Option<StoreHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<String>,
}

/// Everything a caller needs, built once from `Config`.
pub struct AppContext {
    config: Config,
    orchestrator: CollectionOrchestrator,
    persistence: PersistenceGateway,
    calendar: Option<CalendarSyncer>,
}

impl AppContext {
    /// Wires the real HTTP adapters. Search and generation credentials are mandatory;
    /// the calendar is optional and reported by `calendar()` when used.
    pub fn from_config(config: Config) -> Result<Self> {
        let credentials = &config.credentials;

        let search_client = build_client(Duration::from_secs(config.search.timeout_secs))?;
        let search = GoogleSearchClient::new(
            search_client,
            config.search.endpoint.clone(),
            require(&credentials.google_api_key, GOOGLE_API_KEY_ENV)?,
            require(&credentials.google_search_engine_id, GOOGLE_SEARCH_ENGINE_ID_ENV)?,
        );

        let generation_client = build_client(Duration::from_secs(config.extraction.timeout_secs))?;
        let generator = GeminiClient::new(
            generation_client,
            config.extraction.endpoint.clone(),
            config.extraction.model.clone(),
            require(&credentials.gemini_api_key, GEMINI_API_KEY_ENV)?,
        );

        let calendar: Option<Arc<dyn CalendarProvider>> = if credentials.calendar_configured() {
            let client = build_client(Duration::from_secs(config.calendar.timeout_secs))?;
            Some(Arc::new(GoogleCalendarClient::new(
                client,
                config.calendar.endpoint.clone(),
                require(&credentials.calendar_id, GOOGLE_CALENDAR_ID_ENV)?,
                require(&credentials.calendar_access_token, GOOGLE_CALENDAR_ACCESS_TOKEN_ENV)?,
            )))
        } else {
            warn!("Calendar credentials not configured; calendar sync disabled");
            None
        };

        let store = build_document_store(&config.storage);
        info!("Using {:?} document store", config.storage.backend);

        Self::with_ports(
            config,
            Ports {
                search: Arc::new(search),
                generator: Arc::new(generator),
                calendar,
                store,
            },
        )
    }

    /// Wires the pipeline around caller-supplied ports.
    pub fn with_ports(config: Config, ports: Ports) -> Result<Self> {
        let offset = config.timezone.offset()?;

        let search = SearchAggregator::new(ports.search, SearchSettings::from(&config.search));
        let extraction = ExtractionEngine::new(ports.generator);
        let orchestrator = CollectionOrchestrator::new(
            Arc::new(search),
            Arc::new(extraction),
            Validator::new(config.validation.confidence_floor),
            offset,
        )
        .with_genre(config.extraction.genre.clone())
        .with_concurrency(config.batch.concurrency)
        .with_run_timeout(config.batch.run_timeout());

        let persistence = PersistenceGateway::from_config(ports.store, &config.storage);

        let calendar = match ports.calendar {
            Some(provider) => Some(CalendarSyncer::new(
                provider,
                RetryPolicy::from(&config.calendar),
                CalendarSettings::from_config(&config.timezone, &config.calendar)?,
            )),
            None => None,
        };

        Ok(Self {
            config,
            orchestrator,
            persistence,
            calendar,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &CollectionOrchestrator {
        &self.orchestrator
    }

    pub fn persistence(&self) -> &PersistenceGateway {
        &self.persistence
    }

    pub fn calendar(&self) -> Result<&CalendarSyncer> {
        self.calendar.as_ref().ok_or_else(|| {
            CollectorError::Config(format!(
                "calendar sync requires {GOOGLE_CALENDAR_ID_ENV} and {GOOGLE_CALENDAR_ACCESS_TOKEN_ENV}"
            ))
        })
    }

    pub async fn status(&self) -> StatusReport {
        let mut report = status_report(&self.config, self.persistence.store().as_ref()).await;
        report.calendar_configured = self.calendar.is_some();
        report
    }
}

/// Credential presence and store health. Needs no provider credentials.
pub async fn status_report(config: &Config, store: &dyn DocumentStore) -> StatusReport {
    let (storage, storage_error) = match store.health_check().await {
        Ok(health) => (Some(health), None),
        Err(e) => (None, Some(e.to_string())),
    };
    StatusReport {
        credentials: config.credentials.presence().into_iter().collect(),
        calendar_configured: config.credentials.calendar_configured(),
        storage,
        storage_error,
    }
}
