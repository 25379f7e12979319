//! Daily index date handling.
//!
//! Store queries run against yesterday's index: the statistics for a
//! day keep arriving until after midnight, so querying the previous day
//! (with the run scheduled well away from the rollover) avoids reading
//! incomplete data.

use chrono::{DateTime, Duration, Utc};

/// Format one day as a daily-index date (`YYYY.MM.DD`).
pub fn index_date(day: DateTime<Utc>) -> String {
    day.format("%Y.%m.%d").to_string()
}

/// The index date for the day before `now`.
pub fn yesterday(now: DateTime<Utc>) -> String {
    index_date(now - Duration::days(1))
}

/// Index dates for the `days` days preceding `now`, most recent first,
/// today excluded.
pub fn daily_dates_back(now: DateTime<Utc>, days: u32) -> Vec<String> {
    (1..=i64::from(days))
        .map(|back| index_date(now - Duration::days(back)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 7, 7, 12, 0, 0).unwrap()
    }

    #[test]
    fn yesterday_formats_daily_index_date() {
        assert_eq!(yesterday(noon()), "2018.07.06");
    }

    #[test]
    fn dates_back_exclude_today() {
        let dates = daily_dates_back(noon(), 3);
        assert_eq!(dates, vec!["2018.07.06", "2018.07.05", "2018.07.04"]);
    }

    #[test]
    fn dates_back_cross_month_boundary() {
        let dates = daily_dates_back(noon(), 7);
        assert_eq!(dates.last().unwrap(), "2018.06.30");
    }
}
