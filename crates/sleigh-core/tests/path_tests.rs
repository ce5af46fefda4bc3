use sleigh_core::path::CONFIG_ENV;
use sleigh_core::*;
use std::env;
use std::path::PathBuf;

#[test]
fn test_resolve_config_path_with_explicit() {
    let result = resolve_config_path(Some("/etc/sleigh/icecaps.toml")).unwrap();
    assert_eq!(result, PathBuf::from("/etc/sleigh/icecaps.toml"));
}

#[test]
fn test_resolve_config_path_priority() {
    // Set environment variable
    unsafe {
        env::set_var(CONFIG_ENV, "/env/dashboard.toml");
    }

    // Explicit should override env var
    let explicit = resolve_config_path(Some("/explicit/dashboard.toml")).unwrap();
    assert_eq!(explicit, PathBuf::from("/explicit/dashboard.toml"));

    let from_env = resolve_config_path(None).unwrap();
    assert_eq!(from_env, PathBuf::from("/env/dashboard.toml"));

    // Clean up
    unsafe {
        env::remove_var(CONFIG_ENV);
    }
}

#[test]
fn test_expand_tilde_leaves_plain_paths() {
    assert_eq!(expand_tilde("/data/asfs"), PathBuf::from("/data/asfs"));
    assert_eq!(expand_tilde("relative/dir"), PathBuf::from("relative/dir"));
}

#[test]
fn test_expand_tilde_uses_home() {
    if let Some(home) = dirs::home_dir() {
        assert_eq!(expand_tilde("~/data/mrr"), home.join("data/mrr"));
    }
}
