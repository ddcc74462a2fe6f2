pub mod app;
pub mod calendar;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod idempotency;
pub mod infra;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod types;

pub use config::Config;
pub use context::AppContext;
pub use error::{CollectorError, Result};
