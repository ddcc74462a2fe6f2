//! Defaults and fixed provider parameters shared across the crate.

// Provider endpoints
pub const GOOGLE_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GOOGLE_CALENDAR_ENDPOINT: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

// Search
pub const DEFAULT_PAGE_SIZE: u8 = 5;
pub const MAX_PAGE_SIZE: u8 = 5;
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 15;
pub const DEFAULT_INTER_QUERY_DELAY_MS: u64 = 100;
pub const DEFAULT_SEARCH_LANGUAGE: &str = "lang_ja";

// Validation
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.5;
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

// Calendar
pub const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;
pub const DEFAULT_EVENT_DURATION_HOURS: i64 = 2;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const REMINDER_EMAIL_MINUTES: u32 = 24 * 60;
pub const REMINDER_POPUP_MINUTES: u32 = 60;

// Batch collection
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

// Persistence
pub const SCHEDULES_COLLECTION: &str = "schedules";
pub const DEFAULT_PARTITION: &str = "default_user";
