use super::{Dataset, Values, Variable};
use crate::{Error, Result};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Row-major stride information for one axis of a variable.
struct AxisLayout {
    outer: usize,
    len: usize,
    inner: usize,
}

impl AxisLayout {
    fn new(shape: &[usize], axis: usize) -> Self {
        Self {
            outer: shape[..axis].iter().product(),
            len: shape[axis],
            inner: shape[axis + 1..].iter().product(),
        }
    }

    fn block(&self) -> usize {
        self.len * self.inner
    }
}

impl Dataset {
    /// Select positions `indices` along `dim` from every variable spanning it.
    pub fn take_along(&self, dim: &str, indices: &[usize]) -> Result<Dataset> {
        let size = self
            .dim_size(dim)
            .ok_or_else(|| Error::MissingDimension(dim.to_string()))?;
        if let Some(bad) = indices.iter().find(|&&i| i >= size) {
            return Err(Error::Shape(format!(
                "index {} out of bounds for dimension '{}' of size {}",
                bad, dim, size
            )));
        }

        let mut dims = self.dims.clone();
        dims.insert(dim.to_string(), indices.len());
        Ok(Dataset {
            dims,
            coords: self.take_group(&self.coords, dim, indices)?,
            data_vars: self.take_group(&self.data_vars, dim, indices)?,
            attrs: self.attrs.clone(),
        })
    }

    fn take_group(
        &self,
        group: &BTreeMap<String, Variable>,
        dim: &str,
        indices: &[usize],
    ) -> Result<BTreeMap<String, Variable>> {
        let mut out = BTreeMap::new();
        for (name, variable) in group {
            let taken = match variable.axis(dim) {
                None => variable.clone(),
                Some(axis) => {
                    let layout = AxisLayout::new(&self.shape(variable)?, axis);
                    let mut flat = Vec::with_capacity(layout.outer * indices.len() * layout.inner);
                    for o in 0..layout.outer {
                        for &i in indices {
                            let base = (o * layout.len + i) * layout.inner;
                            flat.extend(base..base + layout.inner);
                        }
                    }
                    Variable {
                        dims: variable.dims.clone(),
                        values: variable.values.take(&flat),
                        attrs: variable.attrs.clone(),
                    }
                }
            };
            out.insert(name.clone(), taken);
        }
        Ok(out)
    }

    /// Join `other` after `self` along `dim`.
    ///
    /// Variables spanning `dim` must exist on both sides with identical
    /// dimension lists and value kinds. Variables not spanning `dim` are taken
    /// from `self`, or from `other` when `self` lacks them.
    pub fn concat(&self, other: &Dataset, dim: &str) -> Result<Dataset> {
        let left_len = self
            .dim_size(dim)
            .ok_or_else(|| Error::MissingDimension(dim.to_string()))?;
        let right_len = other
            .dim_size(dim)
            .ok_or_else(|| Error::MissingDimension(dim.to_string()))?;

        for (name, &size) in &self.dims {
            if name == dim {
                continue;
            }
            if let Some(&other_size) = other.dims.get(name)
                && other_size != size
            {
                return Err(Error::Incompatible(format!(
                    "dimension '{}' has size {} and {}",
                    name, size, other_size
                )));
            }
        }

        let mut dims = self.dims.clone();
        for (name, &size) in &other.dims {
            dims.entry(name.clone()).or_insert(size);
        }
        dims.insert(dim.to_string(), left_len + right_len);

        Ok(Dataset {
            dims,
            coords: concat_group(self, other, &self.coords, &other.coords, dim)?,
            data_vars: concat_group(self, other, &self.data_vars, &other.data_vars, dim)?,
            attrs: self.attrs.clone(),
        })
    }

    /// Stable-sort every variable along `dim` by its index coordinate.
    pub fn sort_along(&mut self, dim: &str) -> Result<()> {
        let index = &self.index_coord(dim)?.values;
        let mut order: Vec<usize> = (0..index.len()).collect();
        order.sort_by(|&a, &b| index.compare(a, b));
        if order.iter().enumerate().all(|(pos, &i)| pos == i) {
            return Ok(());
        }
        *self = self.take_along(dim, &order)?;
        Ok(())
    }

    /// Rows whose time index along `dim` satisfies `start <= t < end`.
    ///
    /// The index must already be sorted ascending.
    pub fn time_slice(&self, dim: &str, start: NaiveDateTime, end: NaiveDateTime) -> Result<Dataset> {
        let times = self
            .index_coord(dim)?
            .values
            .as_time()
            .ok_or_else(|| Error::NotTimeIndexed(dim.to_string()))?;
        let lo = times.partition_point(|t| *t < start);
        let hi = times.partition_point(|t| *t < end).max(lo);
        let rows: Vec<usize> = (lo..hi).collect();
        self.take_along(dim, &rows)
    }

    /// Copy with every dimension, coordinate and variable name mapped through `rename`.
    pub fn rename_all(&self, rename: impl Fn(&str) -> String) -> Dataset {
        let rename_var = |variable: &Variable| Variable {
            dims: variable.dims.iter().map(|d| rename(d)).collect(),
            values: variable.values.clone(),
            attrs: variable.attrs.clone(),
        };
        Dataset {
            dims: self
                .dims
                .iter()
                .map(|(name, &size)| (rename(name), size))
                .collect(),
            coords: self
                .coords
                .iter()
                .map(|(name, v)| (rename(name), rename_var(v)))
                .collect(),
            data_vars: self
                .data_vars
                .iter()
                .map(|(name, v)| (rename(name), rename_var(v)))
                .collect(),
            attrs: self.attrs.clone(),
        }
    }

    /// Rename a dimension everywhere it is used. Variable names are untouched.
    pub fn rename_dim(&mut self, from: &str, to: &str) -> Result<()> {
        if self.dims.contains_key(to) {
            return Err(Error::Incompatible(format!("dimension '{}' already exists", to)));
        }
        let size = self
            .dims
            .remove(from)
            .ok_or_else(|| Error::MissingDimension(from.to_string()))?;
        self.dims.insert(to.to_string(), size);
        for variable in self.coords.values_mut().chain(self.data_vars.values_mut()) {
            for d in variable.dims.iter_mut().filter(|d| *d == from) {
                *d = to.to_string();
            }
        }
        Ok(())
    }

    /// Rename a coordinate or data variable.
    pub fn rename_var(&mut self, from: &str, to: &str) -> Result<()> {
        if self.variable(to).is_some() {
            return Err(Error::Incompatible(format!("variable '{}' already exists", to)));
        }
        if let Some(variable) = self.coords.remove(from) {
            self.coords.insert(to.to_string(), variable);
        } else if let Some(variable) = self.data_vars.remove(from) {
            self.data_vars.insert(to.to_string(), variable);
        } else {
            return Err(Error::MissingVariable(from.to_string()));
        }
        Ok(())
    }

    pub fn drop_vars<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        for name in names {
            let name = name.as_ref();
            if self.coords.remove(name).is_none() && self.data_vars.remove(name).is_none() {
                return Err(Error::MissingVariable(name.to_string()));
            }
        }
        Ok(())
    }

    /// Add a leading length-1 dimension `dim` to every data variable and
    /// every non-index coordinate.
    ///
    /// The new index coordinate holds the first element of coordinate `from`,
    /// e.g. the initialisation time of a forecast file.
    pub fn expand_dims(&mut self, dim: &str, from: &str) -> Result<()> {
        if self.dims.contains_key(dim) {
            return Err(Error::Incompatible(format!("dimension '{}' already exists", dim)));
        }
        let source = self
            .coords
            .get(from)
            .ok_or_else(|| Error::MissingVariable(from.to_string()))?;
        if source.is_empty() {
            return Err(Error::Shape(format!("coordinate '{}' is empty", from)));
        }
        let first = source.values.take(&[0]);

        let non_index_coords = self
            .coords
            .iter_mut()
            .filter(|(name, coord)| !(coord.dims.len() == 1 && coord.dims[0] == **name))
            .map(|(_, coord)| coord);
        for variable in non_index_coords.chain(self.data_vars.values_mut()) {
            variable.dims.insert(0, dim.to_string());
        }
        self.dims.insert(dim.to_string(), 1);
        self.coords.insert(dim.to_string(), Variable::new([dim], first));
        Ok(())
    }
}

fn concat_group(
    left_ds: &Dataset,
    right_ds: &Dataset,
    left: &BTreeMap<String, Variable>,
    right: &BTreeMap<String, Variable>,
    dim: &str,
) -> Result<BTreeMap<String, Variable>> {
    let mut out = BTreeMap::new();
    for (name, lv) in left {
        let Some(axis) = lv.axis(dim) else {
            out.insert(name.clone(), lv.clone());
            continue;
        };
        let rv = right.get(name).ok_or_else(|| {
            Error::Incompatible(format!("variable '{}' missing from appended dataset", name))
        })?;
        if rv.dims != lv.dims {
            return Err(Error::Incompatible(format!(
                "variable '{}' has dims {:?} and {:?}",
                name, lv.dims, rv.dims
            )));
        }
        let left_layout = AxisLayout::new(&left_ds.shape(lv)?, axis);
        let right_layout = AxisLayout::new(&right_ds.shape(rv)?, axis);
        let (lb, rb) = (left_layout.block(), right_layout.block());

        let mut values: Values = lv.values.empty_like(lv.len() + rv.len());
        for o in 0..left_layout.outer {
            values.extend_from(&lv.values, o * lb..(o + 1) * lb)?;
            values.extend_from(&rv.values, o * rb..(o + 1) * rb)?;
        }
        out.insert(
            name.clone(),
            Variable {
                dims: lv.dims.clone(),
                values,
                attrs: lv.attrs.clone(),
            },
        );
    }

    for (name, rv) in right {
        if left.contains_key(name) {
            continue;
        }
        if rv.axis(dim).is_some() {
            return Err(Error::Incompatible(format!(
                "variable '{}' missing from existing dataset",
                name
            )));
        }
        out.insert(name.clone(), rv.clone());
    }
    Ok(out)
}
