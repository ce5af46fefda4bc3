use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

/// Flat, row-major storage backing one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Values {
    /// `null` in a document reads as NaN (JSON has no NaN literal)
    Float(#[serde(deserialize_with = "nullable_floats")] Vec<f64>),
    Int(Vec<i64>),
    Time(Vec<NaiveDateTime>),
    Text(Vec<String>),
}

fn nullable_floats<'de, D>(deserializer: D) -> std::result::Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Option<f64>>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Float,
    Int,
    Time,
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Float => "float",
            ValueKind::Int => "int",
            ValueKind::Time => "time",
            ValueKind::Text => "text",
        };
        f.write_str(name)
    }
}

macro_rules! map_values {
    ($values:expr, $inner:ident => $body:expr) => {
        match $values {
            Values::Float($inner) => Values::Float($body),
            Values::Int($inner) => Values::Int($body),
            Values::Time($inner) => Values::Time($body),
            Values::Text($inner) => Values::Text($body),
        }
    };
}

impl Values {
    pub fn kind(&self) -> ValueKind {
        match self {
            Values::Float(_) => ValueKind::Float,
            Values::Int(_) => ValueKind::Int,
            Values::Time(_) => ValueKind::Time,
            Values::Text(_) => ValueKind::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Values::Float(v) => v.len(),
            Values::Int(v) => v.len(),
            Values::Time(v) => v.len(),
            Values::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_float(&self) -> Option<&[f64]> {
        match self {
            Values::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&[i64]> {
        match self {
            Values::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&[NaiveDateTime]> {
        match self {
            Values::Time(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            Values::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Earliest and latest timestamp, ignoring order. `None` for non-time or empty values.
    pub fn time_extent(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let times = self.as_time()?;
        let min = times.iter().min()?;
        let max = times.iter().max()?;
        Some((*min, *max))
    }

    /// Gather elements by flat index. Indices must be in bounds.
    pub(crate) fn take(&self, indices: &[usize]) -> Values {
        map_values!(self, v => indices.iter().map(|&i| v[i].clone()).collect())
    }

    pub(crate) fn empty_like(&self, capacity: usize) -> Values {
        map_values!(self, _v => Vec::with_capacity(capacity))
    }

    pub(crate) fn extend_from(&mut self, other: &Values, range: Range<usize>) -> Result<()> {
        match (self, other) {
            (Values::Float(a), Values::Float(b)) => a.extend_from_slice(&b[range]),
            (Values::Int(a), Values::Int(b)) => a.extend_from_slice(&b[range]),
            (Values::Time(a), Values::Time(b)) => a.extend_from_slice(&b[range]),
            (Values::Text(a), Values::Text(b)) => a.extend_from_slice(&b[range]),
            (a, b) => {
                return Err(Error::Incompatible(format!(
                    "cannot join {} values with {} values",
                    a.kind(),
                    b.kind()
                )));
            }
        }
        Ok(())
    }

    /// Total order between two elements, used for sorting along an index.
    pub(crate) fn compare(&self, a: usize, b: usize) -> Ordering {
        match self {
            Values::Float(v) => v[a].total_cmp(&v[b]),
            Values::Int(v) => v[a].cmp(&v[b]),
            Values::Time(v) => v[a].cmp(&v[b]),
            Values::Text(v) => v[a].cmp(&v[b]),
        }
    }
}
