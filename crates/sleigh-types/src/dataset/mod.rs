//! Labeled-array datasets.
//!
//! A [`Dataset`] is a set of named dimensions plus coordinate and data
//! variables laid out over those dimensions. Values are stored flat in
//! row-major order, so a variable with dims `[a, b]` has `size(a) * size(b)`
//! elements and its last dimension varies fastest.

mod ops;
mod values;

pub use values::{ValueKind, Values};

use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub dims: Vec<String>,
    pub values: Values,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
}

impl Variable {
    pub fn new<I, S>(dims: I, values: Values) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dims: dims.into_iter().map(Into::into).collect(),
            values,
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Position of `dim` in this variable's dimension list.
    pub fn axis(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub dims: BTreeMap<String, usize>,
    #[serde(default)]
    pub coords: BTreeMap<String, Variable>,
    #[serde(default)]
    pub data_vars: BTreeMap<String, Variable>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dim(mut self, name: impl Into<String>, size: usize) -> Self {
        self.dims.insert(name.into(), size);
        self
    }

    pub fn with_coord(mut self, name: impl Into<String>, variable: Variable) -> Self {
        self.coords.insert(name.into(), variable);
        self
    }

    pub fn with_var(mut self, name: impl Into<String>, variable: Variable) -> Self {
        self.data_vars.insert(name.into(), variable);
        self
    }

    pub fn dim_size(&self, dim: &str) -> Option<usize> {
        self.dims.get(dim).copied()
    }

    /// Coordinate or data variable by name; coordinates win on a clash.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name).or_else(|| self.data_vars.get(name))
    }

    pub fn variables(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.coords.iter().chain(self.data_vars.iter())
    }

    /// Every dimension, coordinate and data variable name.
    pub fn names(&self) -> BTreeSet<String> {
        self.dims
            .keys()
            .chain(self.coords.keys())
            .chain(self.data_vars.keys())
            .cloned()
            .collect()
    }

    /// True when the dataset holds no variables at all.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty() && self.data_vars.is_empty()
    }

    /// Check every variable against the declared dimension sizes.
    pub fn validate(&self) -> Result<()> {
        for (name, variable) in self.variables() {
            let expected = self.shape(variable)?.iter().product::<usize>();
            if variable.len() != expected {
                return Err(Error::Shape(format!(
                    "variable '{}' has {} values, dims {:?} require {}",
                    name,
                    variable.len(),
                    variable.dims,
                    expected
                )));
            }
        }
        Ok(())
    }

    /// First and last timestamp of the time index along `dim`.
    pub fn time_bounds(&self, dim: &str) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let times = self.index_coord(dim).ok()?.values.as_time()?;
        Some((*times.first()?, *times.last()?))
    }

    pub(crate) fn shape(&self, variable: &Variable) -> Result<Vec<usize>> {
        variable
            .dims
            .iter()
            .map(|dim| {
                self.dim_size(dim)
                    .ok_or_else(|| Error::MissingDimension(dim.clone()))
            })
            .collect()
    }

    /// The index coordinate of `dim`: a coordinate named `dim` spanning only `dim`.
    pub(crate) fn index_coord(&self, dim: &str) -> Result<&Variable> {
        if !self.dims.contains_key(dim) {
            return Err(Error::MissingDimension(dim.to_string()));
        }
        self.coords
            .get(dim)
            .filter(|coord| coord.dims.len() == 1 && coord.dims[0] == dim)
            .ok_or_else(|| Error::MissingVariable(format!("index coordinate '{}'", dim)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new()
            .with_dim("time", 2)
            .with_dim("range", 3)
            .with_coord("time", Variable::new(["time"], Values::Int(vec![0, 1])))
            .with_var(
                "beta",
                Variable::new(["time", "range"], Values::Float(vec![0.0; 6])),
            )
    }

    #[test]
    fn test_validate_accepts_consistent_shapes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_length() {
        let ds = sample().with_var("bad", Variable::new(["range"], Values::Float(vec![1.0])));
        assert!(matches!(ds.validate(), Err(Error::Shape(_))));
    }

    #[test]
    fn test_validate_rejects_unknown_dimension() {
        let ds = sample().with_var("bad", Variable::new(["height"], Values::Float(vec![])));
        assert_eq!(
            ds.validate(),
            Err(Error::MissingDimension("height".to_string()))
        );
    }

    #[test]
    fn test_names_cover_dims_coords_and_vars() {
        let names: Vec<String> = sample().names().into_iter().collect();
        assert_eq!(names, vec!["beta", "range", "time"]);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::json!({
            "dims": {"time": 1},
            "coords": {"time": {"dims": ["time"], "values": {"time": ["2024-05-09T00:00:00"]}}},
            "data_vars": {"t2m": {"dims": ["time"], "values": {"float": [271.5]}}}
        });
        let ds: Dataset = serde_json::from_value(json).unwrap();
        assert!(ds.validate().is_ok());
        assert_eq!(ds.variable("t2m").unwrap().values.as_float(), Some(&[271.5][..]));
    }
}
