//! Assertions on time-indexed datasets.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use sleigh_types::{Dataset, parse_datetime};
use std::collections::BTreeSet;

/// The time index along `dim`.
pub fn times(dataset: &Dataset, dim: &str) -> Result<Vec<NaiveDateTime>> {
    let coord = dataset
        .coords
        .get(dim)
        .with_context(|| format!("no coordinate '{}'", dim))?;
    let times = coord
        .values
        .as_time()
        .with_context(|| format!("coordinate '{}' is not time-valued", dim))?;
    Ok(times.to_vec())
}

/// Assert the time index along `dim` equals `expected` exactly.
pub fn assert_times(dataset: &Dataset, dim: &str, expected: &[&str]) -> Result<()> {
    let actual = times(dataset, dim)?;
    let expected = expected
        .iter()
        .map(|t| parse_datetime(t).map_err(anyhow::Error::from))
        .collect::<Result<Vec<_>>>()?;
    if actual != expected {
        bail!("Expected times {:?}, got {:?}", expected, actual);
    }
    Ok(())
}

/// Assert the time index along `dim` is non-decreasing.
pub fn assert_sorted(dataset: &Dataset, dim: &str) -> Result<()> {
    let actual = times(dataset, dim)?;
    if let Some(pos) = actual.windows(2).position(|w| w[0] > w[1]) {
        bail!("'{}' out of order at {}: {} > {}", dim, pos, actual[pos], actual[pos + 1]);
    }
    Ok(())
}

/// Assert the calendar days present along `dim` are exactly `expected`.
pub fn assert_days(dataset: &Dataset, dim: &str, expected: &[&str]) -> Result<()> {
    let actual: BTreeSet<NaiveDate> = times(dataset, dim)?.iter().map(|t| t.date()).collect();
    let expected = expected
        .iter()
        .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
        .collect::<std::result::Result<BTreeSet<_>, _>>()?;
    if actual != expected {
        bail!("Expected days {:?}, got {:?}", expected, actual);
    }
    Ok(())
}
