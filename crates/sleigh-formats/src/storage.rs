use crate::Result;
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;

/// Fail unless `dir` exists, is a directory and can be listed.
pub fn ensure_readable(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        )
        .into());
    }
    std::fs::read_dir(dir)?;
    Ok(())
}

/// Names of the regular files directly inside `dir`.
pub fn list_files(dir: &Path) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.insert(name.to_string());
        }
    }
    Ok(names)
}
