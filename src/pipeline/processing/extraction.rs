use crate::app::ports::TextGenerator;
use crate::error::{CollectorError, Result};
use crate::pipeline::processing::lenient_json::decode_array_field;
use crate::types::{RawEvent, SearchResult};
use metrics::counter;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

const EVENTS_KEY: &str = "events";

const EXTRACTION_PROMPT: &str = r#"From the search results below, extract only reliable upcoming {scope} schedule information for {subject}.

Trustworthy sources:
- Official sites of the artist, label or agency
- Major media (newspapers, broadcasters, established music and entertainment outlets)
- Official ticketing platforms (e.g. e+, Ticket Pia, Lawson Ticket)
- Government or municipal announcements
- Verified official social media accounts

Untrustworthy sources (ignore them):
- Personal blogs, aggregator and affiliate sites, wikis, forums, Q&A sites
- Posts containing speculation markers such as "maybe", "apparently", "rumor", "leak", "prediction", "unconfirmed"
- Anonymous boards and unofficial social media posts

Extraction rules:
1. Only include events with an explicit date.
2. Exclude past dates.
3. Exclude anything with confidence below 0.7.
4. When the same event appears more than once, keep the most reliable entry.
5. Exclude events that are not related to {subject}.{genre_rule}

Search results:
{search_results}

Answer with JSON only, no other text, in exactly this shape:
{
    "events": [
        {
            "date": "YYYY-MM-DD",
            "time": "HH:MM",
            "title": "event title",
            "artist": "{subject}",
            "type": "concert|release|tv-appearance|radio-appearance|event|fan-meeting|other",
            "location": "venue",
            "source": "https://...",
            "confidence": 0.9,
            "reliability": "high|medium|low"{genre_field}
        }
    ]
}

If nothing is reliable or nothing matches, return an empty array instead of guessing:
{
    "events": []
}"#;

/// Numbered, delimited block of search results for the prompt.
pub fn format_search_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            format!(
                "[Search result {}]\nTitle: {}\nURL: {}\nSummary: {}\n",
                i + 1,
                result.title,
                result.url,
                result.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// The single extraction prompt for one collection.
///
/// A genre tag widens the scope beyond concerts ("K-POP", "theatre", ...) and asks the model to
/// echo it back.
pub fn build_prompt(subject: &str, results: &[SearchResult], genre: Option<&str>) -> String {
    let genre = genre.map(str::trim).filter(|g| !g.is_empty());
    let (scope, genre_rule, genre_field) = match genre {
        Some(g) => (
            g.to_string(),
            format!("\n6. Exclude information that does not fit the {g} genre."),
            format!(",\n            \"genre\": \"{g}\""),
        ),
        None => ("appearance".to_string(), String::new(), String::new()),
    };

    EXTRACTION_PROMPT
        .replace("{scope}", &scope)
        .replace("{genre_rule}", &genre_rule)
        .replace("{genre_field}", &genre_field)
        .replace("{subject}", subject)
        .replace("{search_results}", &format_search_results(results))
}

/// Pulls raw events out of a model response. Never fails: anything unparseable yields
/// an empty list (whole response) or is skipped (single element).
pub fn parse_events(response: &str) -> Vec<RawEvent> {
    let items = match decode_array_field(response, EVENTS_KEY) {
        Ok(items) => items,
        Err(e) => {
            warn!("Could not decode model response: {}", e);
            debug!("Raw response: {}", response);
            counter!("schedule_feed_extraction_parse_failures_total").increment(1);
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<RawEvent>(item) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!("Skipping malformed event {}: {}", i, e);
                None
            }
        })
        .collect()
}

/// Turns aggregated search results into raw events with one generative call.
pub struct ExtractionEngine {
    generator: Arc<dyn TextGenerator>,
}

impl ExtractionEngine {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Errors only on cancellation or when the provider itself fails; a response we
    /// cannot parse is an empty result.
    #[instrument(skip(self, results, cancel), fields(results = results.len()))]
    pub async fn extract(
        &self,
        results: &[SearchResult],
        subject: &str,
        genre: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<RawEvent>> {
        let prompt = build_prompt(subject, results, genre);
        debug!("Sending extraction request ({} chars)", prompt.len());

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CollectorError::Cancelled),
            response = self.generator.generate(&prompt) => response,
        };

        let response = response.map_err(|e| {
            counter!("schedule_feed_extraction_errors_total").increment(1);
            CollectorError::provider("text generation", e)
        })?;

        let events = parse_events(&response);
        info!("Extraction completed: {} raw events for {}", events.len(), subject);
        counter!("schedule_feed_raw_events_total").increment(events.len() as u64);
        Ok(events)
    }
}
