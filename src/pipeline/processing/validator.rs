use crate::constants::DEFAULT_CONFIDENCE;
use crate::pipeline::processing::event_type::classify_event_type;
use crate::pipeline::processing::text_normalizer::{normalize_date_in_year, normalize_time};
use crate::types::{RawEvent, Reliability, ValidatedEvent};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use metrics::counter;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// Why a raw event did not make it into the output. Not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingField,
    UnparseableDate,
    PastDate,
    MalformedConfidence,
    LowConfidence,
    LowReliability,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MissingField => "missing_field",
            Rejection::UnparseableDate => "unparseable_date",
            Rejection::PastDate => "past_date",
            Rejection::MalformedConfidence => "malformed_confidence",
            Rejection::LowConfidence => "low_confidence",
            Rejection::LowReliability => "low_reliability",
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Number or numeric string; `None` when absent, `Err` when present but not numeric.
fn parse_confidence(value: &Option<Value>) -> Result<f64, Rejection> {
    let confidence = match value {
        None | Some(Value::Null) => DEFAULT_CONFIDENCE,
        Some(Value::Number(n)) => n.as_f64().ok_or(Rejection::MalformedConfidence)?,
        Some(Value::String(s)) => s.trim().parse().map_err(|_| Rejection::MalformedConfidence)?,
        Some(_) => return Err(Rejection::MalformedConfidence),
    };
    if confidence.is_nan() {
        return Err(Rejection::MalformedConfidence);
    }
    Ok(confidence.clamp(0.0, 1.0))
}

/// Sorts by (date, time or "00:00") ascending. Stable, so already-sorted input is untouched.
pub fn sort_events(events: &mut [ValidatedEvent]) {
    events.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

/// Per-event normalization and trust filtering of extracted events.
#[derive(Debug, Clone)]
pub struct Validator {
    confidence_floor: f64,
}

impl Validator {
    pub fn new(confidence_floor: f64) -> Self {
        Self { confidence_floor }
    }

    pub fn confidence_floor(&self) -> f64 {
        self.confidence_floor
    }

    /// Validates one event against the collection date `today`.
    pub fn validate_event(
        &self,
        raw: &RawEvent,
        subject: &str,
        today: NaiveDate,
        validated_at: DateTime<Utc>,
    ) -> Result<ValidatedEvent, Rejection> {
        let (date_text, title) = match (non_blank(&raw.date), non_blank(&raw.title)) {
            (Some(date), Some(title)) => (date, title),
            _ => return Err(Rejection::MissingField),
        };

        let date = normalize_date_in_year(date_text, today.year()).ok_or(Rejection::UnparseableDate)?;
        if date < today {
            return Err(Rejection::PastDate);
        }

        let time = raw
            .time
            .as_deref()
            .and_then(normalize_time)
            .unwrap_or_default();

        let artist = match non_blank(&raw.artist) {
            Some(artist) if artist.to_lowercase().contains(&subject.to_lowercase()) => artist.to_string(),
            _ => subject.to_string(),
        };

        let confidence = parse_confidence(&raw.confidence)?;
        let reliability = raw
            .reliability
            .as_deref()
            .and_then(Reliability::from_label)
            .unwrap_or(Reliability::Medium);

        if confidence < self.confidence_floor {
            return Err(Rejection::LowConfidence);
        }
        if reliability == Reliability::Low {
            return Err(Rejection::LowReliability);
        }

        Ok(ValidatedEvent {
            date,
            time,
            title: title.to_string(),
            artist,
            subject: subject.to_string(),
            event_type: classify_event_type(raw.event_type.as_deref().unwrap_or_default()),
            location: non_blank(&raw.location).unwrap_or_default().to_string(),
            source: non_blank(&raw.source).unwrap_or_default().to_string(),
            confidence,
            reliability,
            genre: non_blank(&raw.genre).map(str::to_string),
            validated_at,
        })
    }

    /// Validates, deduplicates and sorts a batch of raw events.
    ///
    /// Events sharing a date and (case-insensitive) title collapse to the one with the
    /// highest confidence.
    pub fn validate(&self, raw_events: &[RawEvent], subject: &str, today: NaiveDate) -> Vec<ValidatedEvent> {
        let validated_at = Utc::now();
        let mut kept: Vec<ValidatedEvent> = Vec::new();
        let mut index: HashMap<(NaiveDate, String), usize> = HashMap::new();

        for (i, raw) in raw_events.iter().enumerate() {
            match self.validate_event(raw, subject, today, validated_at) {
                Ok(event) => {
                    let key = (event.date, event.title.to_lowercase());
                    match index.get(&key) {
                        Some(&at) if kept[at].confidence >= event.confidence => {
                            debug!("Dropping duplicate event {}: {}", i, event.title);
                        }
                        Some(&at) => kept[at] = event,
                        None => {
                            index.insert(key, kept.len());
                            kept.push(event);
                        }
                    }
                }
                Err(reason) => {
                    debug!("Rejected event {}: {}", i, reason.as_str());
                    counter!("schedule_feed_events_rejected_total", "reason" => reason.as_str()).increment(1);
                }
            }
        }

        sort_events(&mut kept);
        counter!("schedule_feed_events_validated_total").increment(kept.len() as u64);
        info!("Validation completed: {} of {} events kept", kept.len(), raw_events.len());
        kept
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_CONFIDENCE_FLOOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventType;
    use chrono::Duration;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn raw(date: &str, title: &str) -> RawEvent {
        RawEvent {
            date: Some(date.to_string()),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    fn with(mut event: RawEvent, confidence: Value, reliability: &str) -> RawEvent {
        event.confidence = Some(confidence);
        event.reliability = Some(reliability.to_string());
        event
    }

    #[test]
    fn drops_yesterday_keeps_tomorrow() {
        let yesterday = (today() - Duration::days(1)).to_string();
        let tomorrow = (today() + Duration::days(1)).to_string();
        let events = vec![
            with(raw(&yesterday, "Past show"), json!(0.9), "high"),
            with(raw(&tomorrow, "Next show"), json!(0.6), "medium"),
        ];

        let kept = Validator::default().validate(&events, "IU", today());

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Next show");
        assert_eq!(kept[0].reliability, Reliability::Medium);
    }

    #[test]
    fn today_is_not_past() {
        let events = vec![raw(&today().to_string(), "Tonight")];
        assert_eq!(Validator::default().validate(&events, "IU", today()).len(), 1);
    }

    #[test]
    fn low_confidence_dropped_regardless_of_reliability() {
        let events = vec![
            with(raw("2025-07-01", "A"), json!(0.4), "high"),
            with(raw("2025-07-02", "B"), json!(0.4), "medium"),
        ];
        assert!(Validator::default().validate(&events, "IU", today()).is_empty());
    }

    #[test]
    fn low_reliability_dropped() {
        let event = with(raw("2025-07-01", "A"), json!(0.95), "low");
        let result = Validator::default().validate_event(&event, "IU", today(), Utc::now());
        assert_eq!(result.unwrap_err(), Rejection::LowReliability);
    }

    #[test]
    fn missing_required_fields() {
        let validator = Validator::default();
        let no_title = RawEvent {
            date: Some("2025-07-01".into()),
            title: Some("   ".into()),
            ..Default::default()
        };
        let no_date = RawEvent {
            title: Some("Show".into()),
            ..Default::default()
        };
        assert_eq!(validator.validate_event(&no_title, "IU", today(), Utc::now()), Err(Rejection::MissingField));
        assert_eq!(validator.validate_event(&no_date, "IU", today(), Utc::now()), Err(Rejection::MissingField));
        assert_eq!(
            validator.validate_event(&raw("someday", "Show"), "IU", today(), Utc::now()),
            Err(Rejection::UnparseableDate)
        );
    }

    #[test]
    fn defaults_and_normalization() {
        let mut event = raw("2025年7月1日", "Arena");
        event.time = Some("18時".into());
        event.event_type = Some("ライブ".into());
        event.location = Some("  Tokyo Dome ".into());

        let validated = Validator::default()
            .validate_event(&event, "IU", today(), Utc::now())
            .unwrap();

        assert_eq!(validated.date.to_string(), "2025-07-01");
        assert_eq!(validated.time, "18:00");
        assert_eq!(validated.event_type, EventType::Concert);
        assert_eq!(validated.location, "Tokyo Dome");
        assert_eq!(validated.confidence, 0.5);
        assert_eq!(validated.reliability, Reliability::Medium);
        assert_eq!(validated.artist, "IU");
    }

    #[test]
    fn month_day_uses_collection_year() {
        let validated = Validator::default()
            .validate_event(&raw("12月24日", "Xmas"), "IU", today(), Utc::now())
            .unwrap();
        assert_eq!(validated.date, NaiveDate::from_ymd_opt(2025, 12, 24).unwrap());
    }

    #[test]
    fn unparseable_time_becomes_empty() {
        let mut event = raw("2025-07-01", "Show");
        event.time = Some("TBA".into());
        let validated = Validator::default().validate_event(&event, "IU", today(), Utc::now()).unwrap();
        assert_eq!(validated.time, "");
    }

    #[test]
    fn artist_bound_to_subject() {
        let validator = Validator::default();
        let mut event = raw("2025-07-01", "Show");
        event.artist = Some("IU & Friends".into());
        let guest = validator.validate_event(&event, "iu", today(), Utc::now()).unwrap();
        assert_eq!(guest.artist, "IU & Friends");
        assert_eq!(guest.subject, "iu");

        event.artist = Some("Somebody Else".into());
        assert_eq!(validator.validate_event(&event, "IU", today(), Utc::now()).unwrap().artist, "IU");
    }

    #[test]
    fn confidence_parsing() {
        assert_eq!(parse_confidence(&None), Ok(0.5));
        assert_eq!(parse_confidence(&Some(json!("0.8"))), Ok(0.8));
        assert_eq!(parse_confidence(&Some(json!(1.7))), Ok(1.0));
        assert_eq!(parse_confidence(&Some(json!(-3))), Ok(0.0));
        assert_eq!(parse_confidence(&Some(json!("high"))), Err(Rejection::MalformedConfidence));
        assert_eq!(parse_confidence(&Some(json!([0.9]))), Err(Rejection::MalformedConfidence));
    }

    #[test]
    fn custom_floor() {
        let event = with(raw("2025-07-01", "A"), json!(0.6), "medium");
        let strict = Validator::new(0.7);
        assert_eq!(strict.validate_event(&event, "IU", today(), Utc::now()), Err(Rejection::LowConfidence));
    }

    #[test]
    fn output_sorted_by_date_then_time() {
        let mut late = raw("2025-07-01", "Late");
        late.time = Some("20:00".into());
        let untimed = raw("2025-07-01", "Untimed");
        let mut early = raw("2025-07-01", "Early");
        early.time = Some("09:30".into());
        let first_day = raw("2025-06-20", "First");

        let kept = Validator::default().validate(&[late, untimed, early, first_day], "IU", today());
        let titles: Vec<_> = kept.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Untimed", "Early", "Late"]);

        let mut resorted = kept.clone();
        sort_events(&mut resorted);
        assert_eq!(resorted, kept);
    }

    #[test]
    fn duplicates_keep_highest_confidence() {
        let events = vec![
            with(raw("2025-07-01", "Arena Show"), json!(0.6), "medium"),
            with(raw("2025-07-01", "arena show"), json!(0.9), "high"),
            with(raw("2025-07-01", "ARENA SHOW"), json!(0.7), "high"),
        ];
        let kept = Validator::default().validate(&events, "IU", today());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[0].title, "arena show");
    }

    #[test]
    fn every_survivor_satisfies_output_invariants() {
        let events: Vec<RawEvent> = (0..20)
            .map(|i| {
                let date = (today() + Duration::days(i - 5)).to_string();
                let reliability = ["high", "medium", "low", "unknown"][(i % 4) as usize];
                with(raw(&date, &format!("Show {i}")), json!(i as f64 / 10.0 - 0.3), reliability)
            })
            .collect();

        let validator = Validator::default();
        let kept = validator.validate(&events, "IU", today());
        assert!(!kept.is_empty());
        for event in &kept {
            assert!(event.date >= today());
            assert!((0.0..=1.0).contains(&event.confidence));
            assert!(event.confidence >= validator.confidence_floor());
            assert_ne!(event.reliability, Reliability::Low);
        }
    }
}
