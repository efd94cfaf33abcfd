use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::time_utils::current_utc;

/// Replaces `path` with `content` via a sibling temp file and a rename, so a
/// reader sees either the previous report or the complete new one.
pub fn write_text_atomic(path: &Path, content: &str) -> Result<()> {
    let parent_dir = destination_parent(path)?;
    std::fs::create_dir_all(&parent_dir)
        .with_context(|| format!("failed to create {}", parent_dir.display()))?;

    let staging_path = staging_path(&parent_dir, path);
    std::fs::write(&staging_path, content)
        .with_context(|| format!("failed to stage {}", staging_path.display()))?;
    if let Err(error) = std::fs::rename(&staging_path, path) {
        let _ = std::fs::remove_file(&staging_path);
        return Err(error).with_context(|| {
            format!(
                "failed to move staged report {} into {}",
                staging_path.display(),
                path.display()
            )
        });
    }
    Ok(())
}

fn destination_parent(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        bail!("destination path cannot be empty");
    }
    if path.is_dir() {
        bail!("destination path '{}' is a directory", path.display());
    }
    Ok(path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

fn staging_path(parent_dir: &Path, path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("loopwatch-report");
    parent_dir.join(format!(
        ".{file_name}.staging-{}-{}",
        std::process::id(),
        current_utc().timestamp_millis()
    ))
}
