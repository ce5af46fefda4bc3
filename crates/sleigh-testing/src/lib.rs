//! Testing infrastructure for sleigh tests.
//!
//! - `DataWorld`: isolated storage with per-day source files and a config
//! - `fixtures`: small labeled datasets and date helpers
//! - `assertions`: checks on time indexes

pub mod assertions;
pub mod fixtures;
pub mod world;

pub use world::DataWorld;
