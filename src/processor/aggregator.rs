//! Aggregate table assembly
//!
//! Loads every per-plate table of a directory and stacks them into one
//! table. Tables with differing headers are combined diagonally: a column
//! missing from one plate is left empty for that plate's rows. Blank header
//! cells are named after their position, which keeps them apart from each
//! other and from the leading row-index column added on write.

use super::discovery::FileDiscovery;
use crate::constants::{ROW_INDEX_COLUMN, UNNAMED_COLUMN_PREFIX};
use crate::error::{PlateError, Result};

use polars::functions::concat_df_diagonal;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Concatenates per-plate tables into one aggregate table
#[derive(Debug)]
pub struct TableAggregator {
    tables_dir: PathBuf,
    extension: String,
}

impl TableAggregator {
    pub fn new(tables_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            tables_dir: tables_dir.into(),
            extension: extension.into(),
        }
    }

    /// Aggregate every table (in path order) into `output_path`, returning the row count
    pub fn aggregate_to(&self, output_path: &Path) -> Result<usize> {
        let tables = FileDiscovery::new(&self.tables_dir).discover(&self.extension)?;
        if tables.is_empty() {
            return Err(PlateError::aggregation(
                &self.tables_dir,
                "no plate tables to aggregate",
            ));
        }

        let frames = tables
            .iter()
            .map(|path| read_table(path))
            .collect::<Result<Vec<_>>>()?;

        let combined = concat_df_diagonal(&frames)
            .map_err(|e| PlateError::aggregation(&self.tables_dir, e.to_string()))?;
        let mut indexed = combined
            .with_row_index(ROW_INDEX_COLUMN.into(), None)
            .map_err(|e| PlateError::aggregation(output_path, e.to_string()))?;

        write_table(&mut indexed, output_path)?;

        debug!(
            "Aggregated {} tables ({} rows, {} columns) into {}",
            tables.len(),
            indexed.height(),
            indexed.width(),
            output_path.display()
        );

        Ok(indexed.height())
    }
}

/// Read one table with every column kept as text
fn read_table(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .and_then(|mut df| {
            name_blank_columns(&mut df)?;
            Ok(df)
        })
        .map_err(|e| PlateError::aggregation(path, e.to_string()))
}

/// Rename blank column headers to `Unnamed: <position>`
fn name_blank_columns(df: &mut DataFrame) -> PolarsResult<()> {
    if !df.get_column_names().iter().any(|name| name.is_empty()) {
        return Ok(());
    }

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .enumerate()
        .map(|(position, name)| {
            if name.is_empty() {
                format!("{}{}", UNNAMED_COLUMN_PREFIX, position)
            } else {
                name.to_string()
            }
        })
        .collect();

    df.set_column_names(names)
}

fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .map_err(|e| PlateError::aggregation(path, format!("cannot create output: {}", e)))?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| PlateError::aggregation(path, e.to_string()))
}
