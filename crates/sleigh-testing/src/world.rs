//! DataWorld pattern for declarative storage setup.
//!
//! Each world is a temp directory holding one subdirectory per source and an
//! optional dashboard config. Files are written the way instruments deliver
//! them: one per day, possibly late, possibly broken.

use assert_cmd::Command;
use sleigh_types::Dataset;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated storage for source files.
///
/// # Example
/// ```no_run
/// use sleigh_testing::DataWorld;
/// use sleigh_testing::fixtures::{day, hourly};
///
/// let world = DataWorld::new();
/// world.write_json("asfs", "asfs_20240509.json", &hourly(day("2024-05-09"), &[0, 1], "temp"));
/// world.corrupt("asfs", "asfs_20240510.json");
/// ```
pub struct DataWorld {
    temp_dir: TempDir,
    config_path: PathBuf,
}

impl Default for DataWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl DataWorld {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config").join("dashboard.toml");
        Self {
            temp_dir,
            config_path,
        }
    }

    /// Get the temp directory root.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Storage directory of `source`, created on first use.
    pub fn source_dir(&self, source: &str) -> PathBuf {
        let dir = self.root().join("data").join(source);
        std::fs::create_dir_all(&dir).expect("Failed to create source dir");
        dir
    }

    /// Write `dataset` as a JSON file of `source`.
    pub fn write_json(&self, source: &str, file: &str, dataset: &Dataset) -> PathBuf {
        let content = serde_json::to_string_pretty(dataset).expect("Failed to serialize dataset");
        self.write_raw(source, file, &content)
    }

    pub fn write_raw(&self, source: &str, file: &str, content: &str) -> PathBuf {
        let path = self.source_dir(source).join(file);
        std::fs::write(&path, content).expect("Failed to write source file");
        path
    }

    /// Replace a file with truncated JSON.
    pub fn corrupt(&self, source: &str, file: &str) -> PathBuf {
        self.write_raw(source, file, "{\"dims\": {\"time\": 3}, \"coords\": {")
    }

    pub fn remove(&self, source: &str, file: &str) {
        std::fs::remove_file(self.source_dir(source).join(file)).expect("Failed to remove file");
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Write the dashboard config; `{data}` is replaced with the storage root.
    pub fn write_config(&self, toml: &str) -> PathBuf {
        let data_root = self.root().join("data");
        std::fs::create_dir_all(&data_root).expect("Failed to create data dir");
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create config dir");
        }
        let content = toml.replace("{data}", &data_root.display().to_string());
        std::fs::write(&self.config_path, content).expect("Failed to write config");
        self.config_path.clone()
    }

    /// Point a CLI command at this world's config.
    ///
    /// The caller provides the base command (e.g. from `cargo_bin_cmd!("sleigh")`).
    pub fn configure_command<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        cmd.arg("--config")
            .arg(&self.config_path)
            .current_dir(self.root())
            .env_remove("SLEIGH_CONFIG")
            .env_remove("RUST_LOG")
    }
}
