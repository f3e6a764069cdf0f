//! Plate readout parsing.
//!
//! Reads one tab-separated instrument readout and extracts the plate name,
//! the column headers and the keyed data rows from fixed positions of the
//! non-blank line sequence. Every offset violation is reported as a parse
//! error rather than silently producing a shifted record.

use crate::constants::layout::{
    COLUMNS_LINE, DATA_START_LINE, FIELD_SEPARATOR, MIN_LINES, PLATE_NAME_FIELD,
    PLATE_NAME_LINE, ROW_KEY_FIELDS,
};
use crate::error::{PlateError, Result};
use crate::models::{PlateRecord, RowData, RowKey};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Parse a plate readout file into a plate record
pub fn parse_plate_file(file_path: &Path) -> Result<PlateRecord> {
    let content = fs::read_to_string(file_path)?;
    let record = parse_plate(&content, file_path)?;

    debug!(
        "Parsed plate '{}' from {}: {} columns, {} rows",
        record.name,
        file_path.display(),
        record.columns.len(),
        record.row_count()
    );

    Ok(record)
}

/// Parse readout text; `source` is only used for error reporting
pub fn parse_plate(content: &str, source: &Path) -> Result<PlateRecord> {
    let lines = split_lines(content);

    if lines.len() < MIN_LINES {
        return Err(PlateError::parse(
            source,
            format!(
                "expected at least {} non-blank lines, found {}",
                MIN_LINES,
                lines.len()
            ),
        ));
    }

    let name = lines[PLATE_NAME_LINE]
        .get(PLATE_NAME_FIELD)
        .ok_or_else(|| {
            PlateError::parse(
                source,
                format!(
                    "plate name line {} has no field {}",
                    PLATE_NAME_LINE, PLATE_NAME_FIELD
                ),
            )
        })?
        .clone();

    let columns = lines[COLUMNS_LINE].clone();
    let mut record = PlateRecord::new(name, columns);

    for (offset, row) in lines.into_iter().skip(DATA_START_LINE).enumerate() {
        let key = RowKey::from_row(&row).ok_or_else(|| {
            PlateError::parse(
                source,
                format!(
                    "data row {} has {} fields, at least {} are needed for its key",
                    DATA_START_LINE + offset,
                    row.len(),
                    ROW_KEY_FIELDS
                ),
            )
        })?;

        if record.upsert_row(key.clone(), row).is_some() {
            warn!(
                "Duplicate row key {} in {}, keeping the later row",
                key,
                source.display()
            );
        }
    }

    Ok(record)
}

/// Trim every line, drop blank ones and split the rest into fields
fn split_lines(content: &str) -> Vec<RowData> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.split(FIELD_SEPARATOR).map(str::to_string).collect())
        .collect()
}
