//! Declarative per-file preprocessing.
//!
//! Config files cannot carry closures, so sources described in TOML list
//! [`PreprocessStep`]s that [`pipeline`] folds into a [`Preprocess`].

use crate::source::Preprocess;
use serde::{Deserialize, Serialize};
use sleigh_types::Dataset;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PreprocessStep {
    RenameDim { from: String, to: String },
    RenameVar { from: String, to: String },
    DropVars { names: Vec<String> },
    /// Add a length-1 leading dimension indexed by the first value of `from`.
    ExpandDims { dim: String, from: String },
}

impl PreprocessStep {
    pub fn apply(&self, dataset: &mut Dataset) -> sleigh_types::Result<()> {
        match self {
            PreprocessStep::RenameDim { from, to } => dataset.rename_dim(from, to),
            PreprocessStep::RenameVar { from, to } => dataset.rename_var(from, to),
            PreprocessStep::DropVars { names } => dataset.drop_vars(names.as_slice()),
            PreprocessStep::ExpandDims { dim, from } => dataset.expand_dims(dim, from),
        }
    }
}

impl fmt::Display for PreprocessStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreprocessStep::RenameDim { from, to } => write!(f, "rename_dim {} -> {}", from, to),
            PreprocessStep::RenameVar { from, to } => write!(f, "rename_var {} -> {}", from, to),
            PreprocessStep::DropVars { names } => write!(f, "drop_vars {}", names.join(",")),
            PreprocessStep::ExpandDims { dim, from } => write!(f, "expand_dims {} from {}", dim, from),
        }
    }
}

/// Run `steps` in order; the first failing step names itself in the error.
pub fn pipeline(steps: Vec<PreprocessStep>) -> Preprocess {
    Arc::new(move |mut dataset: Dataset| -> anyhow::Result<Dataset> {
        for step in &steps {
            step.apply(&mut dataset)
                .map_err(|e| anyhow::anyhow!("{}: {}", step, e))?;
        }
        Ok(dataset)
    })
}
