//! Common test utilities for configuration tests.

use anyhow::Result;
use std::path::Path;
use tempfile::TempDir;

/// Create a project directory containing a `composer.json` and, optionally,
/// a `broadcast.toml`.
///
/// Returns the temp directory, which must be kept alive.
pub fn create_project(composer_json: &str, broadcast_toml: Option<&str>) -> Result<TempDir> {
    let temp_dir = TempDir::new()?;
    std::fs::write(temp_dir.path().join("composer.json"), composer_json)?;
    if let Some(toml) = broadcast_toml {
        std::fs::write(temp_dir.path().join("broadcast.toml"), toml)?;
    }
    Ok(temp_dir)
}

/// Write a file below `root`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}
