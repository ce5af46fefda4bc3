use crate::{Error, Result};
use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A concrete time range.
///
/// Data slicing treats the range as `start <= t < end`. File selection is
/// coarser: every calendar day touched by `start..=end` is a candidate (see
/// [`TimeRange::days`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Midnight of `start` to midnight of `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        Self::new(midnight(start), midnight(end))
    }

    /// The `days` calendar days ending with (and including) `today`.
    ///
    /// A zero day count is treated as one. Fails when the window leaves the
    /// representable calendar.
    pub fn trailing_days(today: NaiveDate, days: u32) -> Result<Self> {
        let back = u64::from(days.max(1) - 1);
        let start = today.checked_sub_days(Days::new(back)).ok_or_else(|| {
            Error::InvalidRange(format!("{} days before {} is out of range", days, today))
        })?;
        let end = today.succ_opt().ok_or_else(|| {
            Error::InvalidRange(format!("no day follows {}", today))
        })?;
        Self::from_dates(start, end)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Left-inclusive, right-exclusive membership.
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }

    pub fn contains_range(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Calendar days from the start day through the end day, inclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let last = self.end.date();
        self.start
            .date()
            .iter_days()
            .take_while(move |day| *day <= last)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Picker value whose end may still be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenTimeRange {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
}

impl OpenTimeRange {
    pub fn new(start: NaiveDateTime, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    /// Concretize the open end to `now`.
    pub fn resolve(&self, now: NaiveDateTime) -> Result<TimeRange> {
        TimeRange::new(self.start, self.end.unwrap_or(now))
    }
}

pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a user or file supplied timestamp.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS[.fff]]` (space separator also
/// allowed) and RFC 3339 with offset, which is converted to UTC.
pub fn parse_datetime(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(parsed);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(midnight(date));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.naive_utc());
    }
    Err(Error::Parse(format!("unrecognised timestamp '{}'", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(text: &str) -> NaiveDateTime {
        parse_datetime(text).unwrap()
    }

    #[test]
    fn test_new_rejects_reversed_range() {
        let result = TimeRange::new(dt("2024-05-10"), dt("2024-05-09"));
        assert!(matches!(result, Err(Error::InvalidRange(_))));
    }

    #[test]
    fn test_contains_is_right_exclusive() {
        let range = TimeRange::new(dt("2024-05-09"), dt("2024-05-10")).unwrap();
        assert!(range.contains(dt("2024-05-09T00:00")));
        assert!(range.contains(dt("2024-05-09T23:59:59")));
        assert!(!range.contains(dt("2024-05-10T00:00")));
    }

    #[test]
    fn test_days_include_end_day() {
        let range = TimeRange::new(dt("2024-05-09T06:00"), dt("2024-05-11T00:00")).unwrap();
        let days: Vec<String> = range.days().map(|d| d.to_string()).collect();
        assert_eq!(days, vec!["2024-05-09", "2024-05-10", "2024-05-11"]);
    }

    #[test]
    fn test_trailing_days() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let range = TimeRange::trailing_days(today, 2).unwrap();
        assert_eq!(range.start(), dt("2024-05-09"));
        assert_eq!(range.end(), dt("2024-05-11"));
        assert_eq!(TimeRange::trailing_days(today, 0).unwrap().start(), dt("2024-05-10"));
    }

    #[test]
    fn test_trailing_days_past_calendar_start() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let err = TimeRange::trailing_days(today, 100_000_000).unwrap_err();
        assert!(matches!(err, Error::InvalidRange(_)));
        assert!(TimeRange::trailing_days(NaiveDate::MAX, 1).is_err());
    }

    #[test]
    fn test_open_range_resolves_to_now() {
        let open = OpenTimeRange::new(dt("2024-05-09"), None);
        let now = dt("2024-05-12T08:30");
        assert_eq!(open.resolve(now).unwrap().end(), now);
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert_eq!(dt("2024-05-09"), dt("2024-05-09T00:00:00"));
        assert_eq!(dt("2024-05-09 12:30"), dt("2024-05-09T12:30"));
        assert_eq!(dt("2024-05-09T12:30:00+02:00"), dt("2024-05-09T10:30"));
        assert!(parse_datetime("yesterday").is_err());
    }
}
