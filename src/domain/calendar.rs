//! Trading calendar helpers. Weekends only; exchange holidays are not modelled.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Closest weekday strictly before `date`.
pub fn previous_business_day(date: NaiveDate) -> NaiveDate {
    let mut day = date - Duration::days(1);
    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        day -= Duration::days(1);
    }
    day
}

/// Calendar week ending on `today`, used for the high/low range.
pub fn trailing_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(7), today)
}
