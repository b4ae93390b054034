//! Time and date helpers.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::period::Period;

/// UTC timestamp used for sampling and evaluation instants.
pub type Timestamp = DateTime<Utc>;

/// Calendar date used for task deadlines.
pub type Date = NaiveDate;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// The date `period` after the instant `from`.
///
/// Sub-day components move the instant first, so `23h` added late in the
/// evening lands on the next day.
#[must_use]
pub fn date_after(from: Timestamp, period: Period) -> Date {
    (from + period.to_time_delta()).date_naive()
}

/// Whether the instant `at` has reached `period` before the start of `deadline`.
#[must_use]
pub fn is_within(at: Timestamp, deadline: Date, period: Period) -> bool {
    let start = deadline.and_time(NaiveTime::MIN).and_utc();
    at >= start - period.to_time_delta()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_add_days_to_today() {
        let period: Period = "7d".parse().unwrap();
        let date = date_after(at(2024, 3, 1, 10), period);
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
    }

    #[test]
    fn should_roll_over_day_when_hours_cross_midnight() {
        let period: Period = "5h".parse().unwrap();
        let date = date_after(at(2024, 3, 1, 22), period);
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn should_be_within_period_on_exact_day() {
        let deadline = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let period: Period = "5d".parse().unwrap();
        assert!(is_within(at(2024, 3, 5, 0), deadline, period));
        assert!(!is_within(at(2024, 3, 4, 23), deadline, period));
    }
}
