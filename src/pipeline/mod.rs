// Collection pipeline: ingestion, processing, orchestration and storage

pub mod ingestion;
pub mod orchestrator;
pub mod processing;
pub mod storage;

pub use orchestrator::CollectionOrchestrator;
