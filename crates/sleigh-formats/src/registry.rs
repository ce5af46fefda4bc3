use crate::json::JsonReader;
use crate::tabular::CsvReader;
use crate::traits::DatasetReader;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Json,
    Csv,
}

#[derive(Debug, Clone)]
pub struct FormatMetadata {
    pub kind: FormatKind,
    pub name: &'static str,
    pub description: &'static str,
    pub extensions: &'static [&'static str],
}

const FORMATS: &[FormatMetadata] = &[
    FormatMetadata {
        kind: FormatKind::Json,
        name: "json",
        description: "Labeled-array JSON document",
        extensions: &["json"],
    },
    FormatMetadata {
        kind: FormatKind::Csv,
        name: "csv",
        description: "CSV table with a time index column",
        extensions: &["csv"],
    },
];

pub fn get_all_formats() -> &'static [FormatMetadata] {
    FORMATS
}

impl FormatKind {
    pub fn metadata(&self) -> &'static FormatMetadata {
        match self {
            FormatKind::Json => &FORMATS[0],
            FormatKind::Csv => &FORMATS[1],
        }
    }

    pub fn name(&self) -> &'static str {
        self.metadata().name
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormatKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FORMATS
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(s))
            .map(|m| m.kind)
            .ok_or_else(|| Error::UnknownFormat(s.to_string()))
    }
}

/// Create the reader for a format, indexing CSV tables on `index_column`.
pub fn reader_for(kind: FormatKind, index_column: &str) -> Arc<dyn DatasetReader> {
    match kind {
        FormatKind::Json => Arc::new(JsonReader),
        FormatKind::Csv => Arc::new(CsvReader::new(index_column)),
    }
}

/// Detect format from a file name or template extension
pub fn detect_format(path: &Path) -> Result<FormatKind> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| Error::UnknownFormat(format!("no extension on '{}'", path.display())))?;
    FORMATS
        .iter()
        .find(|m| m.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .map(|m| m.kind)
        .ok_or_else(|| Error::UnknownFormat(format!("extension '.{}'", ext)))
}
