// Infrastructure adapters: reqwest-backed implementations of the provider ports

pub mod gemini;
pub mod google_calendar;
pub mod google_search;
pub mod http_client;

pub use gemini::GeminiClient;
pub use google_calendar::GoogleCalendarClient;
pub use google_search::GoogleSearchClient;
