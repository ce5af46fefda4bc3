//! Day-partitioned filename generation.
//!
//! Sources write one file per day (or one per sub-daily run), named by a
//! strftime template such as `summary_asfs_slow_%Y%m%d.json`. Given a time
//! range, [`FileNamer::candidates`] lists the names a complete day-by-day scan
//! would need. No I/O happens here.

use crate::{Error, Result};
use chrono::format::{Item, Numeric, StrftimeItems};
use chrono::NaiveDate;
use sleigh_types::{TimeRange, midnight};
use std::fmt::Write;

/// Placeholder in a template that expands to each run tag, e.g. `_%Y%m%d_*00.json`.
pub const RUN_TAG_WILDCARD: char = '*';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNamer {
    template: String,
    run_tags: Vec<String>,
}

impl FileNamer {
    /// Validate `template` and build a namer.
    ///
    /// The template must format cleanly, include a day-resolution field, and
    /// contain the run-tag wildcard exactly when `run_tags` is non-empty.
    pub fn new<I, S>(template: impl Into<String>, run_tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let template = template.into();
        let run_tags: Vec<String> = run_tags.into_iter().map(Into::into).collect();

        let mut has_day_field = false;
        for item in StrftimeItems::new(&template) {
            match item {
                Item::Error => {
                    return Err(Error::Template(format!(
                        "'{}' is not a valid strftime pattern",
                        template
                    )));
                }
                Item::Numeric(Numeric::Day | Numeric::Ordinal, _) => has_day_field = true,
                _ => {}
            }
        }
        if !has_day_field {
            return Err(Error::Template(format!(
                "'{}' has no day field (%d, %e, %j or %F)",
                template
            )));
        }

        // Fields a date-time cannot supply (e.g. %z) only fail when rendered.
        let mut rendered = String::new();
        if let Some(epoch) = NaiveDate::from_ymd_opt(2000, 1, 1)
            && write!(rendered, "{}", midnight(epoch).format(&template)).is_err()
        {
            return Err(Error::Template(format!(
                "'{}' uses fields unavailable for local timestamps",
                template
            )));
        }

        let has_wildcard = template.contains(RUN_TAG_WILDCARD);
        match (has_wildcard, run_tags.is_empty()) {
            (true, true) => {
                return Err(Error::Template(format!(
                    "'{}' contains '{}' but no run tags are configured",
                    template, RUN_TAG_WILDCARD
                )));
            }
            (false, false) => {
                return Err(Error::Template(format!(
                    "run tags configured but '{}' has no '{}' placeholder",
                    template, RUN_TAG_WILDCARD
                )));
            }
            _ => {}
        }

        Ok(Self { template, run_tags })
    }

    /// One file per day.
    pub fn daily(template: impl Into<String>) -> Result<Self> {
        Self::new(template, Vec::<String>::new())
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn run_tags(&self) -> &[String] {
        &self.run_tags
    }

    /// Names for a single day, in run-tag order.
    pub fn names_for_day(&self, day: NaiveDate) -> Vec<String> {
        let base = midnight(day).format(&self.template).to_string();
        if self.run_tags.is_empty() {
            return vec![base];
        }
        self.run_tags
            .iter()
            .map(|tag| base.replace(RUN_TAG_WILDCARD, tag))
            .collect()
    }

    /// Every name needed to cover `range`, ascending by day, from the start
    /// day through the end day inclusive.
    pub fn candidates(&self, range: &TimeRange) -> Vec<String> {
        range.days().flat_map(|day| self.names_for_day(day)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sleigh_types::parse_datetime;

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange::new(parse_datetime(start).unwrap(), parse_datetime(end).unwrap()).unwrap()
    }

    #[test]
    fn test_daily_candidates_cover_end_day() {
        let namer = FileNamer::daily("summary_mrr_%Y%m%d.json").unwrap();
        let names = namer.candidates(&range("2024-05-09T12:00", "2024-05-11T03:00"));
        assert_eq!(
            names,
            vec![
                "summary_mrr_20240509.json",
                "summary_mrr_20240510.json",
                "summary_mrr_20240511.json",
            ]
        );
    }

    #[test]
    fn test_zero_length_range_names_one_day() {
        let namer = FileNamer::daily("d_%Y-%m-%d.csv").unwrap();
        let names = namer.candidates(&range("2024-05-09T12:00", "2024-05-09T12:00"));
        assert_eq!(names, vec!["d_2024-05-09.csv"]);
    }

    #[test]
    fn test_run_tags_expand_day_major() {
        let namer = FileNamer::new("gfs_%Y%m%d_*00.json", ["00", "12"]).unwrap();
        let names = namer.candidates(&range("2024-05-09", "2024-05-10T06:00"));
        assert_eq!(
            names,
            vec![
                "gfs_20240509_0000.json",
                "gfs_20240509_1200.json",
                "gfs_20240510_0000.json",
                "gfs_20240510_1200.json",
            ]
        );
    }

    #[test]
    fn test_rejects_template_without_day() {
        assert!(matches!(
            FileNamer::daily("monthly_%Y%m.json"),
            Err(Error::Template(_))
        ));
    }

    #[test]
    fn test_accepts_composite_day_field() {
        assert!(FileNamer::daily("level2.%F.json").is_ok());
    }

    #[test]
    fn test_rejects_invalid_pattern() {
        assert!(FileNamer::daily("bad_%Y%m%d_%").is_err());
    }

    #[test]
    fn test_rejects_offset_field() {
        assert!(FileNamer::daily("tz_%Y%m%d%z.json").is_err());
    }

    #[test]
    fn test_wildcard_and_tags_must_agree() {
        assert!(FileNamer::daily("gfs_%Y%m%d_*00.json").is_err());
        assert!(FileNamer::new("gfs_%Y%m%d.json", ["00"]).is_err());
    }
}
