pub mod dataset;
pub mod error;
pub mod range;

pub use dataset::{Dataset, ValueKind, Values, Variable};
pub use error::{Error, Result};
pub use range::{OpenTimeRange, TimeRange, midnight, parse_datetime};
