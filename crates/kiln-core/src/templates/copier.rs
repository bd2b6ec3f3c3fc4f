//! Template file copying

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Copy every file under `source` into `target_dir`, keeping relative paths.
///
/// Both directories are created first if they do not exist, so an artifact
/// without a template folder copies nothing instead of failing. Existing
/// files in the target are overwritten.
pub async fn copy_template(source: &Path, target_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(source)
        .await
        .with_context(|| format!("Failed to create template directory: {}", source.display()))?;
    fs::create_dir_all(target_dir)
        .await
        .context("Failed to create target directory")?;

    let mut copied_files = Vec::new();

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.with_context(|| format!("Failed to walk {}", source.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("{} is outside the template", entry.path().display()))?;
        let target_path = target_dir.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target_path)
                .await
                .with_context(|| format!("Failed to create directory: {}", target_path.display()))?;
            continue;
        }

        // Ensure parent directories exist
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::copy(entry.path(), &target_path)
            .await
            .with_context(|| format!("Failed to write file: {}", target_path.display()))?;

        copied_files.push(relative.to_path_buf());
    }

    Ok(copied_files)
}
