use crate::constants;
use crate::error::{CollectorError, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "SCHEDULE_FEED_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "schedule_feed.toml";

pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const GOOGLE_SEARCH_ENGINE_ID_ENV: &str = "GOOGLE_SEARCH_ENGINE_ID";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GOOGLE_CALENDAR_ID_ENV: &str = "GOOGLE_CALENDAR_ID";
pub const GOOGLE_CALENDAR_ACCESS_TOKEN_ENV: &str = "GOOGLE_CALENDAR_ACCESS_TOKEN";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timezone: TimezoneConfig,
    pub search: SearchConfig,
    pub extraction: ExtractionConfig,
    pub validation: ValidationConfig,
    pub calendar: CalendarConfig,
    pub batch: BatchConfig,
    pub storage: StorageConfig,
    /// Never read from the TOML file; always overlaid from the environment.
    #[serde(skip)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimezoneConfig {
    pub name: String,
    pub utc_offset_hours: i32,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            name: constants::DEFAULT_TIMEZONE.to_string(),
            utc_offset_hours: constants::DEFAULT_UTC_OFFSET_HOURS,
        }
    }
}

impl TimezoneConfig {
    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            CollectorError::Config(format!("invalid utc_offset_hours: {}", self.utc_offset_hours))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub page_size: u8,
    pub max_results: usize,
    pub inter_query_delay_ms: u64,
    pub language: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: constants::GOOGLE_SEARCH_ENDPOINT.to_string(),
            page_size: constants::DEFAULT_PAGE_SIZE,
            max_results: constants::DEFAULT_MAX_SEARCH_RESULTS,
            inter_query_delay_ms: constants::DEFAULT_INTER_QUERY_DELAY_MS,
            language: Some(constants::DEFAULT_SEARCH_LANGUAGE.to_string()),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub endpoint: String,
    pub model: String,
    /// Genre/domain tag that broadens the prompt, e.g. "K-POP" or "theatre".
    pub genre: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: constants::GEMINI_ENDPOINT.to_string(),
            model: constants::DEFAULT_GEMINI_MODEL.to_string(),
            genre: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub confidence_floor: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            confidence_floor: constants::DEFAULT_CONFIDENCE_FLOOR,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub endpoint: String,
    pub max_attempts: u32,
    /// One backoff unit; the wait before retry n (0-based) is unit * (2^n + 1).
    pub backoff_unit_ms: u64,
    pub event_duration_hours: i64,
    pub timeout_secs: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            endpoint: constants::GOOGLE_CALENDAR_ENDPOINT.to_string(),
            max_attempts: constants::DEFAULT_MAX_ATTEMPTS,
            backoff_unit_ms: 1000,
            event_duration_hours: constants::DEFAULT_EVENT_DURATION_HOURS,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub concurrency: usize,
    /// Upper bound for one subject's pipeline; 0 disables the timeout.
    pub run_timeout_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: constants::DEFAULT_BATCH_CONCURRENCY,
            run_timeout_secs: 300,
        }
    }
}

impl BatchConfig {
    pub fn run_timeout(&self) -> Option<Duration> {
        (self.run_timeout_secs > 0).then(|| Duration::from_secs(self.run_timeout_secs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
    pub collection: String,
    /// Per-user partition key written into every stored document.
    pub partition: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("data/documents"),
            collection: constants::SCHEDULES_COLLECTION.to_string(),
            partition: constants::DEFAULT_PARTITION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub google_api_key: Option<String>,
    pub google_search_engine_id: Option<String>,
    pub gemini_api_key: Option<String>,
    pub calendar_id: Option<String>,
    pub calendar_access_token: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            google_api_key: env_non_empty(GOOGLE_API_KEY_ENV),
            google_search_engine_id: env_non_empty(GOOGLE_SEARCH_ENGINE_ID_ENV),
            gemini_api_key: env_non_empty(GEMINI_API_KEY_ENV),
            calendar_id: env_non_empty(GOOGLE_CALENDAR_ID_ENV),
            calendar_access_token: env_non_empty(GOOGLE_CALENDAR_ACCESS_TOKEN_ENV),
        }
    }

    pub fn calendar_configured(&self) -> bool {
        self.calendar_id.is_some() && self.calendar_access_token.is_some()
    }

    /// (variable name, configured?) for every credential, in a stable order.
    pub fn presence(&self) -> Vec<(&'static str, bool)> {
        vec![
            (GOOGLE_API_KEY_ENV, self.google_api_key.is_some()),
            (GOOGLE_SEARCH_ENGINE_ID_ENV, self.google_search_engine_id.is_some()),
            (GEMINI_API_KEY_ENV, self.gemini_api_key.is_some()),
            (GOOGLE_CALENDAR_ID_ENV, self.calendar_id.is_some()),
            (GOOGLE_CALENDAR_ACCESS_TOKEN_ENV, self.calendar_access_token.is_some()),
        ]
    }
}

/// Returns the credential or a configuration error naming the missing variable.
pub fn require<'a>(value: &'a Option<String>, var: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| CollectorError::Config(format!("{var} environment variable is required")))
}

fn env_non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Loads `.env`, the optional TOML file and the credential variables.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            Err(_) => Self::default(),
        };
        config.credentials = Credentials::from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CollectorError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.page_size == 0 || self.search.page_size > constants::MAX_PAGE_SIZE {
            return Err(CollectorError::Config(format!(
                "search.page_size must be between 1 and {}",
                constants::MAX_PAGE_SIZE
            )));
        }
        if self.search.max_results == 0 {
            return Err(CollectorError::Config("search.max_results must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.validation.confidence_floor) {
            return Err(CollectorError::Config(
                "validation.confidence_floor must lie in [0, 1]".into(),
            ));
        }
        if self.calendar.max_attempts == 0 {
            return Err(CollectorError::Config("calendar.max_attempts must be at least 1".into()));
        }
        if self.calendar.event_duration_hours <= 0 {
            return Err(CollectorError::Config(
                "calendar.event_duration_hours must be positive".into(),
            ));
        }
        if self.batch.concurrency == 0 {
            return Err(CollectorError::Config("batch.concurrency must be at least 1".into()));
        }
        self.timezone.offset()?;
        Ok(())
    }
}
