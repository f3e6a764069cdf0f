//! Zipped result bundle
//!
//! Packs the per-plate tables and the aggregate table into one archive:
//! per-plate tables under `plates/`, the aggregate table at the root.

use crate::constants::BUNDLE_PLATES_DIR;
use crate::error::{PlateError, Result};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write a bundle archive to `output_path`
pub fn write_bundle(plate_tables: &[impl AsRef<Path>], aggregate: &Path, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for table in plate_tables {
        let table = table.as_ref();
        let entry = format!("{}/{}", BUNDLE_PLATES_DIR, entry_name(table, output_path)?);
        add_file(&mut zip, &entry, table, options, output_path)?;
    }

    let aggregate_entry = entry_name(aggregate, output_path)?;
    add_file(&mut zip, &aggregate_entry, aggregate, options, output_path)?;

    zip.finish().map_err(|e| bundle_error(output_path, e))?;

    debug!(
        "Bundled {} plate tables and the aggregate table into {}",
        plate_tables.len(),
        output_path.display()
    );

    Ok(())
}

fn add_file(
    zip: &mut ZipWriter<File>,
    entry: &str,
    source: &Path,
    options: SimpleFileOptions,
    output_path: &Path,
) -> Result<()> {
    zip.start_file(entry, options)
        .map_err(|e| bundle_error(output_path, e))?;
    let mut input = File::open(source)?;
    io::copy(&mut input, zip)?;
    Ok(())
}

fn entry_name(path: &Path, output_path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| PlateError::Emission {
            path: output_path.to_path_buf(),
            reason: format!("cannot bundle {}: no file name", path.display()),
        })
}

fn bundle_error(output_path: &Path, e: zip::result::ZipError) -> PlateError {
    PlateError::Emission {
        path: output_path.to_path_buf(),
        reason: format!("failed to write bundle: {}", e),
    }
}
