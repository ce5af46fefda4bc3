// Error types
pub mod error;

// Trait-based architecture (public API)
pub mod traits;

// Reader implementations
pub mod json;
pub mod tabular;

// Format registry
pub mod registry;

// Directory scanning
pub mod storage;

pub use traits::DatasetReader;

pub use json::JsonReader;
pub use tabular::CsvReader;

pub use registry::{FormatKind, FormatMetadata, detect_format, get_all_formats, reader_for};

pub use storage::{ensure_readable, list_files};

pub use error::{Error, Result};
