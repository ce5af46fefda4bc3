//! Date-partitioned source caches and the reactive model on top of them.
//!
//! A [`Dashboard`] owns a global [`RangeControl`]. Every [`Consumer`] in its
//! [`ConsumerGroup`]s mirrors that range, queries the [`SourceCache`]s it
//! needs through a shared [`SourceRegistry`] and pushes the slices to its
//! display units. Turning on comparison mode adds a second group whose data
//! names carry an [`AxisAugmenter`] suffix.

mod error;

pub mod augment;
pub mod config;
pub mod consumer;
pub mod control;
pub mod dashboard;
pub mod group;
pub mod panel;
pub mod preprocess;
pub mod registry;
pub mod source;

pub use augment::{AxisAugmenter, DEFAULT_SUFFIX};
pub use config::{DashboardConfig, RangeConfig, SourceConfig, TabConfig};
pub use consumer::{Consumer, ConsumerSpec, UnitStatus};
pub use control::{RangeBounds, RangeControl, Subscription};
pub use dashboard::{Dashboard, GroupFactory, layout};
pub use error::{Error, Result};
pub use group::ConsumerGroup;
pub use panel::{DataMap, DisplayUnit, Panel, PanelKind, PanelSpec, SeriesSummary, SourceData};
pub use preprocess::PreprocessStep;
pub use registry::{SourceHandle, SourceRegistry};
pub use source::{CacheStats, FileFailure, LoadReport, Preprocess, SourceCache, SourceSpec};
