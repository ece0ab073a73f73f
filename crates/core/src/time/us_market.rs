use chrono::{DateTime, Datelike, Duration, DurationRound, NaiveDate, Timelike, Utc};
use chrono_tz::US::Eastern;
use std::collections::HashSet;

// Notification cycles run on the hour, 08:00 through 18:00 New York time.
const FIRST_RUN_HOUR_ET: u32 = 8;
const LAST_RUN_HOUR_ET: u32 = 18;

/// Whether a cycle starting at `now_utc` falls inside the weekday window.
pub fn is_notification_window(now_utc: DateTime<Utc>, holidays: &HashSet<NaiveDate>) -> bool {
    let now_et = now_utc.with_timezone(&Eastern);
    let date = now_et.date_naive();
    !is_weekend(date)
        && !holidays.contains(&date)
        && (FIRST_RUN_HOUR_ET..=LAST_RUN_HOUR_ET).contains(&now_et.hour())
}

/// The next top of the hour strictly after `now_utc` that is inside the window.
pub fn next_run(now_utc: DateTime<Utc>, holidays: &HashSet<NaiveDate>) -> Option<DateTime<Utc>> {
    let mut tick = now_utc.duration_trunc(Duration::hours(1)).ok()? + Duration::hours(1);
    // Two weeks of hours covers long weekends plus a run of holidays.
    for _ in 0..(24 * 14) {
        if is_notification_window(tick, holidays) {
            return Some(tick);
        }
        tick += Duration::hours(1);
    }
    None
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
}

/// Dates with no notification runs, from US_MARKET_HOLIDAYS="YYYY-MM-DD,YYYY-MM-DD".
pub fn configured_holidays() -> HashSet<NaiveDate> {
    let mut out = HashSet::new();

    if let Ok(s) = std::env::var("US_MARKET_HOLIDAYS") {
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match NaiveDate::parse_from_str(part, "%Y-%m-%d") {
                Ok(d) => {
                    out.insert(d);
                }
                Err(_) => tracing::warn!(entry = part, "ignoring invalid US_MARKET_HOLIDAYS entry"),
            }
        }
    }

    out
}
