use crate::error::{CollectorError, Result};
use crate::pipeline::ingestion::SearchAggregator;
use crate::pipeline::processing::{ExtractionEngine, Validator};
use crate::types::{BatchRun, CollectionRun, SubjectFailure};
use chrono::{FixedOffset, NaiveDate, Utc};
use metrics::{counter, histogram};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Trims names, drops blanks and keeps the first spelling of each subject.
pub fn normalize_subjects(subjects: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    subjects
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Runs search, extraction and validation for one subject or a batch.
///
/// Cheap to clone; every collaborator is shared behind an `Arc`.
#[derive(Clone)]
pub struct CollectionOrchestrator {
    search: Arc<SearchAggregator>,
    extraction: Arc<ExtractionEngine>,
    validator: Validator,
    offset: FixedOffset,
    genre: Option<String>,
    concurrency: usize,
    run_timeout: Option<Duration>,
}

impl CollectionOrchestrator {
    pub fn new(
        search: Arc<SearchAggregator>,
        extraction: Arc<ExtractionEngine>,
        validator: Validator,
        offset: FixedOffset,
    ) -> Self {
        Self {
            search,
            extraction,
            validator,
            offset,
            genre: None,
            concurrency: crate::constants::DEFAULT_BATCH_CONCURRENCY,
            run_timeout: None,
        }
    }

    pub fn with_genre(mut self, genre: Option<String>) -> Self {
        self.genre = genre.filter(|g| !g.trim().is_empty());
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_run_timeout(mut self, run_timeout: Option<Duration>) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    pub async fn collect(&self, subject: &str, horizon_days: u32) -> CollectionRun {
        self.collect_with_cancel(subject, horizon_days, CancellationToken::new()).await
    }

    /// Always returns a verdict. Cancellation or the run timeout discards partial progress.
    #[instrument(skip(self, cancel))]
    pub async fn collect_with_cancel(
        &self,
        subject: &str,
        horizon_days: u32,
        cancel: CancellationToken,
    ) -> CollectionRun {
        let subject = subject.trim();
        if subject.is_empty() {
            return CollectionRun::failed(subject, horizon_days, "subject must not be blank");
        }

        let started = Instant::now();
        let attempt = self.run(subject, horizon_days, &cancel);
        let outcome = match self.run_timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    cancel.cancel();
                    warn!("Collection for {} timed out after {:?}", subject, limit);
                    Err(CollectorError::Cancelled)
                }
            },
            None => attempt.await,
        };
        histogram!("schedule_feed_collection_seconds").record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(run) => {
                let label = if run.success { "ok" } else { "empty" };
                counter!("schedule_feed_collections_total", "outcome" => label).increment(1);
                run
            }
            Err(e) => {
                error!("Collection for {} failed: {}", subject, e);
                counter!("schedule_feed_collections_total", "outcome" => "error").increment(1);
                CollectionRun::failed(subject, horizon_days, format!("collection failed for {subject}: {e}"))
            }
        }
    }

    async fn run(&self, subject: &str, horizon_days: u32, cancel: &CancellationToken) -> Result<CollectionRun> {
        let today = self.today();
        let results = self.search.aggregate(subject, horizon_days, today, cancel).await?;
        if results.is_empty() {
            info!("No search results for {}; skipping extraction", subject);
            return Ok(CollectionRun::failed(
                subject,
                horizon_days,
                format!("no search results for {subject}"),
            ));
        }

        let raw = self
            .extraction
            .extract(&results, subject, self.genre.as_deref(), cancel)
            .await?;
        let events = self.validator.validate(&raw, subject, today);
        info!("Collected {} events for {}", events.len(), subject);
        Ok(CollectionRun::succeeded(subject, horizon_days, results.len(), events))
    }

    /// Collects every subject concurrently, at most `concurrency` at a time.
    ///
    /// One subject failing, erroring or panicking never affects the others.
    #[instrument(skip(self, subjects), fields(subjects = subjects.len()))]
    pub async fn collect_many(&self, subjects: &[String], horizon_days: u32) -> BatchRun {
        let subjects = normalize_subjects(subjects);
        let limiter = Arc::new(Semaphore::new(self.concurrency));

        let handles: Vec<_> = subjects
            .into_iter()
            .map(|subject| {
                let orchestrator = self.clone();
                let limiter = limiter.clone();
                let task_subject = subject.clone();
                let handle = tokio::spawn(async move {
                    let _permit = match limiter.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            return CollectionRun::failed(&task_subject, horizon_days, "concurrency limiter closed")
                        }
                    };
                    orchestrator.collect(&task_subject, horizon_days).await
                });
                (subject, handle)
            })
            .collect();

        let mut successful = Vec::new();
        let mut failed = Vec::new();
        for (subject, handle) in handles {
            match handle.await {
                Ok(run) if run.success => successful.push(run),
                Ok(run) => failed.push(SubjectFailure {
                    subject,
                    message: run.message,
                }),
                Err(join_error) => {
                    error!("Collection task for {} aborted: {}", subject, join_error);
                    failed.push(SubjectFailure {
                        subject,
                        message: format!("collection task aborted: {join_error}"),
                    });
                }
            }
        }

        let total_events = successful.iter().map(|run| run.events.len()).sum();
        let message = format!(
            "collected {} events from {} subjects, {} failed",
            total_events,
            successful.len(),
            failed.len()
        );
        info!("{}", message);

        BatchRun {
            successful,
            failed,
            total_events,
            collected_at: Utc::now(),
            message,
        }
    }
}
