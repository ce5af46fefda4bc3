use std::fmt;

/// Result type for sleigh-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the types layer
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Range start after end, or otherwise unusable range
    InvalidRange(String),

    /// Date/time text could not be parsed
    Parse(String),

    /// Variable length does not match the sizes of its dimensions
    Shape(String),

    /// Dimension referenced but not defined on the dataset
    MissingDimension(String),

    /// Coordinate or data variable not present
    MissingVariable(String),

    /// Two datasets (or a dataset and an operation) do not line up
    Incompatible(String),

    /// Dimension has no time-valued index coordinate
    NotTimeIndexed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidRange(msg) => write!(f, "Invalid range: {}", msg),
            Error::Parse(msg) => write!(f, "Parse error: {}", msg),
            Error::Shape(msg) => write!(f, "Shape error: {}", msg),
            Error::MissingDimension(dim) => write!(f, "Missing dimension: {}", dim),
            Error::MissingVariable(name) => write!(f, "Missing variable: {}", name),
            Error::Incompatible(msg) => write!(f, "Incompatible datasets: {}", msg),
            Error::NotTimeIndexed(dim) => {
                write!(f, "Dimension '{}' has no time index coordinate", dim)
            }
        }
    }
}

impl std::error::Error for Error {}
