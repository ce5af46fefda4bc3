pub mod files;
pub mod show;
pub mod sources;
