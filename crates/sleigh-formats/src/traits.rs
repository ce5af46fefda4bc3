use crate::Result;
use sleigh_types::Dataset;
use std::path::Path;

/// Dataset file parsing
///
/// Responsibilities:
/// - Recognise files it can read (by extension)
/// - Parse a whole file into a validated labeled-array dataset
///
/// A failed parse is never fatal to the caller: the cache layer skips the
/// file and retries it on a later query.
pub trait DatasetReader: Send + Sync {
    /// Unique reader ID (e.g., "json", "csv")
    fn id(&self) -> &'static str;

    /// Check if a file looks like this reader's format
    fn can_handle(&self, path: &Path) -> bool;

    /// Parse file content already in memory
    fn parse_str(&self, content: &str) -> Result<Dataset>;

    /// Parse an entire file
    fn read(&self, path: &Path) -> Result<Dataset> {
        let content = std::fs::read_to_string(path)?;
        self.parse_str(&content)
    }
}

pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
