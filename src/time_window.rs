use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Serialize, Serializer};

/// Symbolic time window found in a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeWindowTag {
    ThisMonth,
    LastMonth,
    LastSixMonths,
    Year(i32),
}

impl fmt::Display for TimeWindowTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimeWindowTag::ThisMonth => f.write_str("this_month"),
            TimeWindowTag::LastMonth => f.write_str("last_month"),
            TimeWindowTag::LastSixMonths => f.write_str("last_6_months"),
            TimeWindowTag::Year(year) => write!(f, "{year}"),
        }
    }
}

impl Serialize for TimeWindowTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Half-open UTC interval `[start, end)`; `start < end` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// Days covered by [`TimeWindowTag::LastSixMonths`].
const SIX_MONTHS_DAYS: i64 = 180;

/// Resolves `tag` against `now`. Tags that cannot be represented (years
/// outside the calendar range) resolve to `None`.
pub fn resolve(tag: TimeWindowTag, now: DateTime<Utc>) -> Option<TimeInterval> {
    let today = now.date_naive();
    let (start, end) = match tag {
        TimeWindowTag::ThisMonth => {
            let first = first_of_month(today.year(), today.month())?;
            (first, next_month(first)?)
        }
        TimeWindowTag::LastMonth => {
            let first = first_of_month(today.year(), today.month())?;
            (previous_month(first)?, first)
        }
        TimeWindowTag::LastSixMonths => (today - Duration::days(SIX_MONTHS_DAYS), today),
        TimeWindowTag::Year(year) => (
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?,
        ),
    };
    TimeInterval::new(midnight(start), midnight(end))
}

fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn next_month(first: NaiveDate) -> Option<NaiveDate> {
    if first.month() == 12 {
        first_of_month(first.year() + 1, 1)
    } else {
        first_of_month(first.year(), first.month() + 1)
    }
}

fn previous_month(first: NaiveDate) -> Option<NaiveDate> {
    if first.month() == 1 {
        first_of_month(first.year() - 1, 12)
    } else {
        first_of_month(first.year(), first.month() - 1)
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 13, 45, 10).unwrap()
    }

    #[test]
    fn this_month() {
        let interval = resolve(TimeWindowTag::ThisMonth, now()).unwrap();
        assert_eq!(interval.start(), at(2024, 3, 1));
        assert_eq!(interval.end(), at(2024, 4, 1));
    }

    #[test]
    fn last_month() {
        let interval = resolve(TimeWindowTag::LastMonth, now()).unwrap();
        assert_eq!(interval.start(), at(2024, 2, 1));
        assert_eq!(interval.end(), at(2024, 3, 1));
    }

    #[test]
    fn month_boundaries_wrap_years() {
        let december = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let interval = resolve(TimeWindowTag::ThisMonth, december).unwrap();
        assert_eq!(interval.start(), at(2023, 12, 1));
        assert_eq!(interval.end(), at(2024, 1, 1));

        let january = at(2024, 1, 10);
        let interval = resolve(TimeWindowTag::LastMonth, january).unwrap();
        assert_eq!(interval.start(), at(2023, 12, 1));
        assert_eq!(interval.end(), at(2024, 1, 1));
    }

    #[test]
    fn last_six_months_truncates_to_midnight() {
        let interval = resolve(TimeWindowTag::LastSixMonths, now()).unwrap();
        assert_eq!(interval.end(), at(2024, 3, 15));
        assert_eq!(interval.start(), at(2023, 9, 17));
    }

    #[test]
    fn year() {
        let interval = resolve(TimeWindowTag::Year(2023), now()).unwrap();
        assert_eq!(interval.start(), at(2023, 1, 1));
        assert_eq!(interval.end(), at(2024, 1, 1));
    }

    #[test]
    fn unrepresentable_year_has_no_interval() {
        assert_eq!(resolve(TimeWindowTag::Year(i32::MAX), now()), None);
    }

    #[test]
    fn interval_rejects_empty_range() {
        assert_eq!(TimeInterval::new(at(2024, 1, 1), at(2024, 1, 1)), None);
    }

    #[test]
    fn tags_display_as_symbols() {
        assert_eq!(TimeWindowTag::LastSixMonths.to_string(), "last_6_months");
        assert_eq!(
            serde_json::to_value(TimeWindowTag::Year(2025)).unwrap(),
            serde_json::json!("2025")
        );
    }
}
