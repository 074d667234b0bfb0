use crate::sketch::snapshot::ImagePayload;
use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

pub const SNAPSHOT_EXPORT_SUBDIR: &str = "snapshots";

pub fn exe_relative_output_folder_from_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(SNAPSHOT_EXPORT_SUBDIR))
}

pub fn default_output_folder() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    exe_relative_output_folder_from_path(&exe_path)
}

pub fn timestamped_stem(now: chrono::DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

pub fn build_filename(stem: &str, suffix: &str) -> String {
    format!("{}_{}.png", stem, suffix)
}

/// Writes the snapshot exactly as it would be sent for recognition.
pub fn write_snapshot(
    payload: &ImagePayload,
    output_dir: &Path,
    now: chrono::DateTime<Local>,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create snapshot output folder {}", output_dir.display()))?;
    let path = output_dir.join(build_filename(&timestamped_stem(now), "sketch"));
    fs::write(&path, payload.bytes())
        .with_context(|| format!("write snapshot {}", path.display()))?;
    Ok(path)
}
