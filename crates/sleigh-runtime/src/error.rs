use std::fmt;

/// Result type for sleigh-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// Source storage directory is missing or cannot be listed
    StorageUnavailable(String),

    /// Configuration error
    Config(String),

    /// A consumer requires a source the registry does not know
    UnknownSource(String),

    /// Two sources registered under one name
    DuplicateSource(String),

    /// Range value outside the control's bounds
    OutOfBounds(String),

    /// Dataset layer error
    Dataset(sleigh_types::Error),

    /// Reader or storage layer error
    Format(sleigh_formats::Error),

    /// Naming or path error
    Core(sleigh_core::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// Invalid operation or state
    InvalidOperation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::StorageUnavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::UnknownSource(name) => write!(f, "Unknown source: {}", name),
            Error::DuplicateSource(name) => write!(f, "Duplicate source: {}", name),
            Error::OutOfBounds(msg) => write!(f, "Range out of bounds: {}", msg),
            Error::Dataset(err) => write!(f, "Dataset error: {}", err),
            Error::Format(err) => write!(f, "Format error: {}", err),
            Error::Core(err) => write!(f, "{}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Dataset(err) => Some(err),
            Error::Format(err) => Some(err),
            Error::Core(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::StorageUnavailable(_)
            | Error::Config(_)
            | Error::UnknownSource(_)
            | Error::DuplicateSource(_)
            | Error::OutOfBounds(_)
            | Error::InvalidOperation(_) => None,
        }
    }
}

impl From<sleigh_types::Error> for Error {
    fn from(err: sleigh_types::Error) -> Self {
        Error::Dataset(err)
    }
}

impl From<sleigh_formats::Error> for Error {
    fn from(err: sleigh_formats::Error) -> Self {
        Error::Format(err)
    }
}

impl From<sleigh_core::Error> for Error {
    fn from(err: sleigh_core::Error) -> Self {
        Error::Core(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
