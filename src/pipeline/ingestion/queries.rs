use crate::types::{QueryVariant, SearchQuery};
use chrono::{Datelike, NaiveDate};

fn render(variant: QueryVariant, subject: &str, year: i32) -> String {
    match variant {
        QueryVariant::ConcertTour => format!("{subject} コンサート ライブ {year} {}", year + 1),
        QueryVariant::ScheduleEvent => format!("{subject} スケジュール イベント {year} {}", year + 1),
        QueryVariant::Ticket => format!("{subject} 公演 チケット 日程"),
        QueryVariant::FanMeeting => format!("{subject} ファンミーティング 握手会 サイン会"),
    }
}

/// The ordered query set for one subject; year-bearing variants cover `today`'s year and the next.
pub fn build_queries(subject: &str, horizon_days: u32, today: NaiveDate) -> Vec<SearchQuery> {
    QueryVariant::ALL
        .iter()
        .map(|&variant| SearchQuery {
            subject: subject.to_string(),
            variant,
            horizon_days,
            text: render(variant, subject, today.year()),
        })
        .collect()
}

/// Provider date restriction for a horizon, e.g. `d30`.
pub fn date_restriction(horizon_days: u32) -> String {
    format!("d{horizon_days}")
}
