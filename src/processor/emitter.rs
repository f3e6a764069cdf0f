//! Per-plate table emission
//!
//! Writes each merged primary plate to its own CSV table: the plate's column
//! headers followed by its rows in their current order. Rows keep their raw
//! field count, so identifier-only rows stay short.

use crate::error::{PlateError, Result};
use crate::models::PlateRecord;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writer for per-plate CSV tables
#[derive(Debug)]
pub struct TableEmitter {
    output_dir: PathBuf,
    extension: String,
}

impl TableEmitter {
    pub fn new(output_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            extension: extension.into(),
        }
    }

    /// Write one table per plate, returning the written paths in plate order
    pub fn emit_all<'a>(
        &self,
        plates: impl IntoIterator<Item = &'a PlateRecord>,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir)?;

        // Case-folded so plates cannot overwrite each other on case-insensitive filesystems
        let mut seen = HashSet::new();
        let mut written = Vec::new();

        for plate in plates {
            let path = self.table_path(&plate.name);
            if !seen.insert(file_stem(&plate.name).to_lowercase()) {
                return Err(PlateError::Emission {
                    path,
                    reason: format!("plate '{}' collides with an earlier plate's file name", plate.name),
                });
            }

            write_table(plate, &path)?;
            written.push(path);
        }

        debug!(
            "Wrote {} plate tables to {}",
            written.len(),
            self.output_dir.display()
        );

        Ok(written)
    }

    /// Output path for a plate name
    pub fn table_path(&self, plate_name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", file_stem(plate_name), self.extension))
    }
}

/// Plate name made safe for use as a single, non-hidden path component
fn file_stem(plate_name: &str) -> String {
    let stem: String = plate_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();

    if stem.is_empty() || stem.starts_with('.') {
        format!("_{}", stem)
    } else {
        stem
    }
}

/// Write a single plate as CSV: header line, then rows
pub fn write_table(plate: &PlateRecord, path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| PlateError::Emission {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    writer.write_record(&plate.columns)?;
    for row in plate.rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;

    debug!(
        "Wrote plate '{}' ({} rows) to {}",
        plate.name,
        plate.row_count(),
        path.display()
    );

    Ok(())
}
