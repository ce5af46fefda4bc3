//! JSON labeled-array documents.
//!
//! The document is the serde form of [`Dataset`]:
//!
//! ```json
//! {
//!   "dims": {"time": 2},
//!   "coords": {"time": {"dims": ["time"], "values": {"time": ["2024-05-09T00:00:00", "2024-05-09T01:00:00"]}}},
//!   "data_vars": {"vaisala_T_mean": {"dims": ["time"], "values": {"float": [-12.5, -12.1]}}}
//! }
//! ```

use crate::traits::{DatasetReader, has_extension};
use crate::Result;
use sleigh_types::Dataset;
use std::path::Path;

pub struct JsonReader;

impl DatasetReader for JsonReader {
    fn id(&self) -> &'static str {
        "json"
    }

    fn can_handle(&self, path: &Path) -> bool {
        has_extension(path, &["json"])
    }

    fn parse_str(&self, content: &str) -> Result<Dataset> {
        let dataset: Dataset = serde_json::from_str(content)?;
        dataset.validate()?;
        Ok(dataset)
    }
}
