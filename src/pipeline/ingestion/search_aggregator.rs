use crate::app::ports::{SearchProvider, SearchRequest};
use crate::config::SearchConfig;
use crate::error::{CollectorError, Result};
use crate::pipeline::ingestion::queries::{build_queries, date_restriction};
use crate::types::SearchResult;
use chrono::NaiveDate;
use metrics::counter;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub page_size: u8,
    pub max_results: usize,
    pub inter_query_delay: Duration,
    pub language: Option<String>,
}

impl From<&SearchConfig> for SearchSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_results: config.max_results,
            inter_query_delay: Duration::from_millis(config.inter_query_delay_ms),
            language: config.language.clone(),
        }
    }
}

/// Keeps the first result for each url, drops empty urls, and stops at `cap`.
pub fn merge_unique(results: impl IntoIterator<Item = SearchResult>, cap: usize) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| !r.url.trim().is_empty())
        .filter(|r| seen.insert(r.url.clone()))
        .take(cap)
        .collect()
}

/// Runs the query set for a subject and merges the hits.
pub struct SearchAggregator {
    provider: Arc<dyn SearchProvider>,
    settings: SearchSettings,
}

impl SearchAggregator {
    pub fn new(provider: Arc<dyn SearchProvider>, settings: SearchSettings) -> Self {
        Self { provider, settings }
    }

    /// Per-query failures are logged and skipped; only cancellation is an error.
    #[instrument(skip(self, cancel))]
    pub async fn aggregate(
        &self,
        subject: &str,
        horizon_days: u32,
        today: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>> {
        let queries = build_queries(subject, horizon_days, today);
        let restriction = date_restriction(horizon_days);
        let mut collected = Vec::new();

        for (i, query) in queries.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(CollectorError::Cancelled);
            }
            if i > 0 && !self.settings.inter_query_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(CollectorError::Cancelled),
                    _ = tokio::time::sleep(self.settings.inter_query_delay) => {}
                }
            }

            let request = SearchRequest {
                query: query.text.clone(),
                page_size: self.settings.page_size,
                date_restriction: restriction.clone(),
                language: self.settings.language.clone(),
            };

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CollectorError::Cancelled),
                outcome = self.provider.search(&request) => outcome,
            };

            match outcome {
                Ok(hits) => {
                    debug!("Query {:?} returned {} hits", query.variant, hits.len());
                    counter!("schedule_feed_search_queries_total", "outcome" => "ok").increment(1);
                    collected.extend(hits.into_iter().map(|hit| SearchResult::from_hit(hit, &query.text)));
                }
                Err(e) => {
                    warn!("Search query '{}' failed: {}", query.text, e);
                    counter!("schedule_feed_search_queries_total", "outcome" => "error").increment(1);
                }
            }
        }

        let results = merge_unique(collected, self.settings.max_results);
        info!("Search aggregated {} unique results for {}", results.len(), subject);
        Ok(results)
    }
}
