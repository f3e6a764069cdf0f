//! Integration tests for the processor module
//!
//! Tests the complete merge pipeline against plate batches written to
//! temporary directories.


use std::fs;
use std::path::{Path, PathBuf};

/// Render a readout file in the instrument layout
pub fn readout(name: &str, columns: &[&str], rows: &[&[&str]]) -> String {
    let mut lines = vec![
        "##BLOCKS= 1".to_string(),
        "Plate:\tPlate1\t1.3\tPlateFormat".to_string(),
        String::new(),
        "Instrument\tSpectraMax".to_string(),
        format!("Name:\t{}", name),
        "Read Mode\tAbsorbance".to_string(),
        "Wavelengths\t450".to_string(),
        String::new(),
        "Temperature(C)\t25.1".to_string(),
        columns.join("\t"),
    ];
    lines.extend(rows.iter().map(|row| row.join("\t")));
    lines.push(String::new());
    lines.join("\n")
}

/// Write a readout file, creating parent directories
pub fn write_readout(dir: &Path, file_name: &str, content: &str) -> PathBuf {
    let path = dir.join(file_name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// Read a CSV file as raw records, header included
pub fn read_records(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}
