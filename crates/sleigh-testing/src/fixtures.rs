//! Deterministic datasets shaped like the instrument summaries.
//!
//! Values encode where they came from: `hourly` stores
//! `day_of_month * 100 + hour`, so a merged store shows which file each row
//! belongs to.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use sleigh_types::{Dataset, TimeRange, Values, Variable, midnight, parse_datetime};

pub fn day(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").expect("fixture date must be YYYY-MM-DD")
}

pub fn timestamp(text: &str) -> NaiveDateTime {
    parse_datetime(text).expect("fixture timestamp must parse")
}

pub fn range(start: &str, end: &str) -> TimeRange {
    TimeRange::new(timestamp(start), timestamp(end)).expect("fixture range must be ordered")
}

fn hours_of(day: NaiveDate, hours: &[u32]) -> Vec<NaiveDateTime> {
    hours
        .iter()
        .map(|&h| midnight(day) + Duration::hours(i64::from(h)))
        .collect()
}

/// One variable sampled at the given hours of `day`.
pub fn hourly(day: NaiveDate, hours: &[u32], var: &str) -> Dataset {
    let values = hours
        .iter()
        .map(|&h| f64::from(day.day() * 100 + h))
        .collect();
    Dataset::new()
        .with_dim("time", hours.len())
        .with_coord("time", Variable::new(["time"], Values::Time(hours_of(day, hours))))
        .with_var(var, Variable::new(["time"], Values::Float(values)))
}

/// Ceilometer-like profile: `beta` over `(time, range)`.
pub fn profile(day: NaiveDate, hours: &[u32], ranges: &[f64]) -> Dataset {
    let beta = hours
        .iter()
        .flat_map(|&h| ranges.iter().map(move |r| f64::from(h) + r / 1000.0))
        .collect();
    Dataset::new()
        .with_dim("time", hours.len())
        .with_dim("range", ranges.len())
        .with_coord("time", Variable::new(["time"], Values::Time(hours_of(day, hours))))
        .with_coord("range", Variable::new(["range"], Values::Float(ranges.to_vec())))
        .with_var(
            "beta",
            Variable::new(["time", "range"], Values::Float(beta)).with_attr("units", "1/(m sr)"),
        )
}

/// Forecast run initialised at `init` with `steps` 3-hourly valid times.
pub fn forecast(init: NaiveDateTime, steps: u32) -> Dataset {
    let times = (0..steps)
        .map(|s| init + Duration::hours(3 * i64::from(s)))
        .collect();
    let t2m = (0..steps).map(|s| 250.0 + f64::from(s)).collect();
    Dataset::new()
        .with_dim("time", steps as usize)
        .with_coord("time", Variable::new(["time"], Values::Time(times)))
        .with_var("t2m", Variable::new(["time"], Values::Float(t2m)))
}
