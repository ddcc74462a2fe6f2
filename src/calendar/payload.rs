use crate::config::{CalendarConfig, TimezoneConfig};
use crate::constants::{REMINDER_EMAIL_MINUTES, REMINDER_POPUP_MINUTES};
use crate::error::Result;
use crate::idempotency::compute_event_key;
use crate::types::ValidatedEvent;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where and how long calendar entries are placed.
#[derive(Debug, Clone)]
pub struct CalendarSettings {
    pub offset: FixedOffset,
    pub time_zone: String,
    pub duration: Duration,
}

impl CalendarSettings {
    pub fn from_config(timezone: &TimezoneConfig, calendar: &CalendarConfig) -> Result<Self> {
        Ok(Self {
            offset: timezone.offset()?,
            time_zone: timezone.name.clone(),
            duration: Duration::hours(calendar.event_duration_hours),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
    /// Set instead of `date_time` for all-day entries created elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedProperties {
    #[serde(default)]
    pub private: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
    #[serde(default)]
    pub overrides: Vec<ReminderOverride>,
}

/// Request body for calendar insert/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventPayload {
    pub summary: String,
    pub location: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub extended_properties: ExtendedProperties,
    pub reminders: Reminders,
}

/// An event as the calendar provider returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventRecord {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: Option<EventDateTime>,
    #[serde(default)]
    pub end: Option<EventDateTime>,
    #[serde(default)]
    pub extended_properties: Option<ExtendedProperties>,
    #[serde(default)]
    pub html_link: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl CalendarEventRecord {
    pub fn private_property(&self, key: &str) -> Option<&str> {
        self.extended_properties
            .as_ref()
            .and_then(|props| props.private.get(key))
            .map(String::as_str)
    }
}

fn localize(naive: NaiveDateTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    let utc = naive - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, offset)
}

fn describe(event: &ValidatedEvent) -> String {
    [
        format!("Artist: {}", event.artist),
        format!("Type: {}", event.event_type),
        format!("Confidence: {:.2}", event.confidence),
        format!("Reliability: {}", event.reliability),
        format!("Source: {}", event.source),
    ]
    .join("\n")
}

/// Converts a validated event into the provider's event shape.
///
/// The entry starts at the event's date and time in the configured zone (midnight when the
/// time is unknown) and lasts `settings.duration`. The private extended properties repeat the
/// traceability fields and carry the deterministic event key for later lookup.
pub fn build_payload(event: &ValidatedEvent, settings: &CalendarSettings) -> CalendarEventPayload {
    let start = localize(event.date.and_time(event.start_time()), settings.offset);
    let end = start + settings.duration;

    let mut private = BTreeMap::new();
    private.insert("artist".to_string(), event.artist.clone());
    private.insert("event_type".to_string(), event.event_type.to_string());
    private.insert("confidence".to_string(), event.confidence.to_string());
    private.insert("reliability".to_string(), event.reliability.to_string());
    private.insert("source".to_string(), event.source.clone());
    private.insert(
        "event_key".to_string(),
        compute_event_key(&event.subject, event.date, &event.title),
    );

    CalendarEventPayload {
        summary: event.title.clone(),
        location: event.location.clone(),
        description: describe(event),
        start: EventDateTime {
            date_time: Some(start),
            date: None,
            time_zone: Some(settings.time_zone.clone()),
        },
        end: EventDateTime {
            date_time: Some(end),
            date: None,
            time_zone: Some(settings.time_zone.clone()),
        },
        extended_properties: ExtendedProperties { private },
        reminders: Reminders {
            use_default: false,
            overrides: vec![
                ReminderOverride {
                    method: "email".to_string(),
                    minutes: REMINDER_EMAIL_MINUTES,
                },
                ReminderOverride {
                    method: "popup".to_string(),
                    minutes: REMINDER_POPUP_MINUTES,
                },
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventType, Reliability};
    use chrono::Utc;
    use serde_json::json;

    fn settings() -> CalendarSettings {
        CalendarSettings {
            offset: FixedOffset::east_opt(9 * 3600).unwrap(),
            time_zone: "Asia/Tokyo".to_string(),
            duration: Duration::hours(2),
        }
    }

    fn event(time: &str) -> ValidatedEvent {
        ValidatedEvent {
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            time: time.to_string(),
            title: "Arena Tour".to_string(),
            artist: "IU".to_string(),
            subject: "IU".to_string(),
            event_type: EventType::Concert,
            location: "Tokyo Dome".to_string(),
            source: "https://example.com/tour".to_string(),
            confidence: 0.9,
            reliability: Reliability::High,
            genre: None,
            validated_at: Utc::now(),
        }
    }

    #[test]
    fn payload_spans_two_hours_in_fixed_zone() {
        let payload = build_payload(&event("19:30"), &settings());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["start"]["dateTime"], json!("2025-03-01T19:30:00+09:00"));
        assert_eq!(json["end"]["dateTime"], json!("2025-03-01T21:30:00+09:00"));
        assert_eq!(json["start"]["timeZone"], json!("Asia/Tokyo"));
        assert_eq!(json["summary"], json!("Arena Tour"));
        assert_eq!(json["reminders"]["useDefault"], json!(false));
        assert_eq!(json["reminders"]["overrides"][0]["minutes"], json!(1440));
    }

    #[test]
    fn missing_time_starts_at_midnight() {
        let payload = build_payload(&event(""), &settings());
        let start = payload.start.date_time.unwrap();
        assert_eq!(start.to_rfc3339(), "2025-03-01T00:00:00+09:00");
    }

    #[test]
    fn description_and_private_properties_trace_the_source() {
        let payload = build_payload(&event("10:00"), &settings());
        assert!(payload.description.contains("Artist: IU"));
        assert!(payload.description.contains("Type: concert"));
        assert!(payload.description.contains("Confidence: 0.90"));
        assert!(payload.description.contains("Reliability: high"));
        assert!(payload.description.contains("Source: https://example.com/tour"));

        let private = &payload.extended_properties.private;
        assert_eq!(private["event_type"], "concert");
        assert_eq!(private["reliability"], "high");
        assert_eq!(private["event_key"].len(), 64);
    }

    #[test]
    fn event_key_follows_subject_not_artist() {
        let mut guest_spot = event("20:00");
        guest_spot.artist = "IU & Friends".to_string();

        let payload = build_payload(&guest_spot, &settings());

        assert_eq!(
            payload.extended_properties.private["event_key"],
            compute_event_key("IU", guest_spot.date, "Arena Tour")
        );
        assert_eq!(payload.extended_properties.private["artist"], "IU & Friends");
    }

    #[test]
    fn record_reads_provider_shape() {
        let record: CalendarEventRecord = serde_json::from_value(json!({
            "id": "evt1",
            "summary": "Arena Tour",
            "start": {"dateTime": "2025-03-01T19:30:00+09:00", "timeZone": "Asia/Tokyo"},
            "end": {"date": "2025-03-02"},
            "extendedProperties": {"private": {"source": "https://example.com"}},
            "htmlLink": "https://calendar.google.com/event?eid=1"
        }))
        .unwrap();

        assert_eq!(record.id, "evt1");
        assert_eq!(record.private_property("source"), Some("https://example.com"));
        assert!(record.end.unwrap().date.is_some());
    }
}
