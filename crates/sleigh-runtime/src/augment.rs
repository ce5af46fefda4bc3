use crate::{Error, Result};
use sleigh_types::Dataset;

/// Suffix used by comparison views unless configured otherwise.
pub const DEFAULT_SUFFIX: &str = "_";

/// Renames every dimension, coordinate and variable of a dataset by
/// appending a suffix, so a second view over the same sources gets its own
/// axes and never links to the primary view's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisAugmenter {
    suffix: String,
}

impl Default for AxisAugmenter {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

impl AxisAugmenter {
    pub fn new(suffix: impl Into<String>) -> Result<Self> {
        let suffix = suffix.into();
        if suffix.is_empty() {
            return Err(Error::Config("axis suffix must not be empty".to_string()));
        }
        Ok(Self { suffix })
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// The augmented form of `base`.
    pub fn name(&self, base: &str) -> String {
        format!("{}{}", base, self.suffix)
    }

    /// Copy of `dataset` with every name augmented; values and shapes are untouched.
    pub fn apply(&self, dataset: &Dataset) -> Dataset {
        dataset.rename_all(|name| self.name(name))
    }
}
