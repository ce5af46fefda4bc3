use crate::{Error, Result};
use std::path::PathBuf;

/// Environment variable naming the dashboard config file.
pub const CONFIG_ENV: &str = "SLEIGH_CONFIG";

/// Resolve the dashboard config file path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. SLEIGH_CONFIG environment variable (with tilde expansion)
/// 3. System config directory (recommended default)
/// 4. ~/.sleigh/dashboard.toml (fallback for systems without a config directory)
pub fn resolve_config_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    // Priority 1: Explicit path
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    // Priority 2: SLEIGH_CONFIG environment variable
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return Ok(expand_tilde(&env_path));
    }

    // Priority 3: System config directory
    if let Some(config_dir) = dirs::config_dir() {
        return Ok(config_dir.join("sleigh").join("dashboard.toml"));
    }

    // Priority 4: Fallback to ~/.sleigh
    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".sleigh").join("dashboard.toml"));
    }

    Err(Error::Config(
        "Could not determine config path: no HOME directory or system config directory found"
            .to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}
