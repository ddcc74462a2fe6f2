//! Date and time recognition for the formats that show up in search snippets and model
//! output: ISO dates, slash dates and the Japanese `年月日` / `時分` forms.
//!
//! Every function here is total: unrecognized or out-of-range input yields `None`.

use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

// Digit runs are bounded on both sides so "123:45" or "2025-07-011" never match a suffix.

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)(\d{4})-(\d{1,2})-(\d{1,2})(?:\D|$)").expect("valid regex"));
static SLASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)(\d{4})/(\d{1,2})/(\d{1,2})(?:\D|$)").expect("valid regex"));
static KANJI_FULL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日").expect("valid regex"));
static KANJI_MONTH_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)(\d{1,2})\s*月\s*(\d{1,2})\s*日").expect("valid regex"));

static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)(\d{1,2}):(\d{2})(?:\D|$)").expect("valid regex"));
static KANJI_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)(\d{1,2})\s*時(?:\s*(\d{1,2})\s*分)?").expect("valid regex"));

/// Folds full-width ASCII to half-width and collapses whitespace runs.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Recognizes a date, using the current local year for month/day-only text.
pub fn normalize_date(text: &str) -> Option<NaiveDate> {
    normalize_date_in_year(text, Local::now().year())
}

/// Recognizes a date; `default_year` fills in `M月D日` without a year.
pub fn normalize_date_in_year(text: &str, default_year: i32) -> Option<NaiveDate> {
    let text = normalize_text(text);
    if text.is_empty() {
        return None;
    }

    for pattern in [&*ISO_DATE, &*SLASH_DATE, &*KANJI_FULL_DATE] {
        if let Some(caps) = pattern.captures(&text) {
            let year = caps[1].parse().ok()?;
            let month = caps[2].parse().ok()?;
            let day = caps[3].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }
    }

    let caps = KANJI_MONTH_DAY.captures(&text)?;
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    NaiveDate::from_ymd_opt(default_year, month, day)
}

/// Recognizes `HH:MM`, `H時M分` and `H時`, returning zero-padded `HH:MM`.
pub fn normalize_time(text: &str) -> Option<String> {
    let text = normalize_text(text);
    if text.is_empty() {
        return None;
    }

    let (hour, minute): (u32, u32) = if let Some(caps) = CLOCK_TIME.captures(&text) {
        (caps[1].parse().ok()?, caps[2].parse().ok()?)
    } else {
        let caps = KANJI_TIME.captures(&text)?;
        let minute = match caps.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        (caps[1].parse().ok()?, minute)
    };

    if hour > 23 || minute > 59 {
        return None;
    }
    Some(format!("{hour:02}:{minute:02}"))
}
