mod error;
pub mod naming;
pub mod path;

pub use error::{Error, Result};
pub use naming::{FileNamer, RUN_TAG_WILDCARD};
pub use path::{expand_tilde, resolve_config_path};
