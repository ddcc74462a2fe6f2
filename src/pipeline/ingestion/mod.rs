// Pipeline ingestion: query construction and search aggregation

pub mod queries;
pub mod search_aggregator;

pub use queries::build_queries;
pub use search_aggregator::{merge_unique, SearchAggregator, SearchSettings};
