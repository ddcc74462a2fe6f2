// Calendar synchronization: payload conversion, retry policy and the syncer

pub mod payload;
pub mod retry;
pub mod syncer;

pub use payload::{build_payload, CalendarEventPayload, CalendarEventRecord, CalendarSettings};
pub use retry::RetryPolicy;
pub use syncer::{CalendarSyncReport, CalendarSyncer};
