//! Upload archive extraction.

use crate::error::{PlateError, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// Whether a path looks like a zip upload
pub fn is_zip_archive(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Extract every entry of `archive_path` below `destination`
///
/// Entries whose names would escape `destination` are rejected.
pub fn extract_zip(archive_path: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive_path)
        .map_err(|e| PlateError::upload_io(archive_path, format!("cannot open archive: {}", e)))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| PlateError::upload_io(archive_path, format!("cannot read archive: {}", e)))?;

    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| {
            PlateError::upload_io(archive_path, format!("cannot read entry {}: {}", i, e))
        })?;

        let relative = entry.enclosed_name().ok_or_else(|| {
            PlateError::upload_io(
                archive_path,
                format!("entry '{}' escapes the extraction directory", entry.name()),
            )
        })?;
        let out_path = destination.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out_file = File::create(&out_path)?;
        io::copy(&mut entry, &mut out_file).map_err(|e| {
            PlateError::upload_io(&out_path, format!("cannot extract entry: {}", e))
        })?;
        extracted.push(out_path);
    }

    debug!(
        "Extracted {} files from {} into {}",
        extracted.len(),
        archive_path.display(),
        destination.display()
    );

    Ok(extracted)
}
