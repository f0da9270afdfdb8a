//! Packing the dump directory into a dated `.tar.gz`.

use crate::utils::errors::{BackupError, Result};
use chrono::{DateTime, Local};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Archive name for a run started at `timestamp`, e.g. `2024-03-01 12:30.tar.gz`.
pub fn archive_name(timestamp: &DateTime<Local>) -> String {
    format!("{}.tar.gz", timestamp.format("%Y-%m-%d %H:%M"))
}

/// Write `dest_dir/<timestamp>.tar.gz` containing `dir` under its own base name.
pub fn create_archive(dir: &Path, dest_dir: &Path, timestamp: &DateTime<Local>) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(BackupError::Archive(format!("{} is not a directory", dir.display())));
    }
    let base_name = dir
        .file_name()
        .ok_or_else(|| BackupError::Archive(format!("{} has no base name", dir.display())))?;
    let path = dest_dir.join(archive_name(timestamp));

    let file = fs::File::create(&path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(base_name, dir)?;
    builder.into_inner()?.finish()?;

    Ok(path)
}

/// Archive `dir`, then delete it.
///
/// The directory is only removed once the archive has been written completely.
pub fn archive_and_remove(dir: &Path, dest_dir: &Path, timestamp: &DateTime<Local>) -> Result<PathBuf> {
    let path = create_archive(dir, dest_dir, timestamp)?;
    info!("Created archive {}", path.display());
    fs::remove_dir_all(dir)?;
    Ok(path)
}
