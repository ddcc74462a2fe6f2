use crate::types::EventType;

/// Keyword table mapping free-text type labels onto the closed vocabulary.
///
/// Checked top to bottom; the first row with a matching keyword wins. Radio and concert
/// rows sit above TV because "ラジオ出演" and "ライブ出演" both contain the TV keyword "出演".
pub const EVENT_TYPE_KEYWORDS: &[(EventType, &[&str])] = &[
    (
        EventType::FanMeeting,
        &[
            "fan-meeting", "fan meeting", "fanmeeting", "fanmeet", "fan meet",
            "ファンミーティング", "ファンミ", "握手会", "サイン会",
        ],
    ),
    (EventType::RadioAppearance, &["radio", "ラジオ"]),
    (
        EventType::Concert,
        &["concert", "live", "tour", "コンサート", "ライブ", "ツアー", "公演"],
    ),
    (
        EventType::TvAppearance,
        &["tv", "television", "テレビ", "出演", "放送", "番組"],
    ),
    (
        EventType::Release,
        &["release", "album", "single", "mv", "リリース", "発売", "アルバム", "シングル"],
    ),
    (
        EventType::Event,
        &["event", "festival", "showcase", "イベント", "フェス", "ショーケース"],
    ),
];

/// Maps a free-text type onto the closed vocabulary, defaulting to `Other`.
pub fn classify_event_type(text: &str) -> EventType {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return EventType::Other;
    }
    EVENT_TYPE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(event_type, _)| *event_type)
        .unwrap_or(EventType::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_japanese_labels() {
        assert_eq!(classify_event_type("コンサート"), EventType::Concert);
        assert_eq!(classify_event_type("リリース"), EventType::Release);
        assert_eq!(classify_event_type("テレビ出演"), EventType::TvAppearance);
        assert_eq!(classify_event_type("ラジオ出演"), EventType::RadioAppearance);
        assert_eq!(classify_event_type("ライブ出演"), EventType::Concert);
        assert_eq!(classify_event_type("公演出演"), EventType::Concert);
        assert_eq!(classify_event_type("イベント"), EventType::Event);
        assert_eq!(classify_event_type("ファンミーティング"), EventType::FanMeeting);
        assert_eq!(classify_event_type("その他"), EventType::Other);
    }

    #[test]
    fn maps_english_labels_case_insensitively() {
        assert_eq!(classify_event_type("LIVE"), EventType::Concert);
        assert_eq!(classify_event_type("World Tour"), EventType::Concert);
        assert_eq!(classify_event_type("New Album"), EventType::Release);
        assert_eq!(classify_event_type("Fan Meeting"), EventType::FanMeeting);
        assert_eq!(classify_event_type(""), EventType::Other);
        assert_eq!(classify_event_type("podcast"), EventType::Other);
    }

    #[test]
    fn canonical_labels_map_to_themselves() {
        for event_type in [
            EventType::Concert,
            EventType::Release,
            EventType::TvAppearance,
            EventType::RadioAppearance,
            EventType::Event,
            EventType::FanMeeting,
            EventType::Other,
        ] {
            assert_eq!(classify_event_type(event_type.as_str()), event_type);
        }
    }
}
