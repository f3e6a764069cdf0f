//! Core data structures for plate merging.
//!
//! Defines row identity, parsed plate records, the primary/completion
//! partition and the statistics reported by a merge run.

use crate::constants::layout::ROW_KEY_FIELDS;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

/// Raw field values of one data row, identifier fields included
pub type RowData = Vec<String>;

/// Identity of a data row: its leading identifier fields
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey([String; ROW_KEY_FIELDS]);

impl RowKey {
    /// Build a key from the leading fields of a row, if it has enough of them
    pub fn from_row(row: &[String]) -> Option<Self> {
        let fields = row.get(..ROW_KEY_FIELDS)?;
        Some(Self(std::array::from_fn(|i| fields[i].clone())))
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// One parsed plate readout
///
/// Rows keep first-insertion order. Overwriting an existing key replaces the
/// row in place; a new key is appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlateRecord {
    pub name: String,
    pub columns: Vec<String>,
    rows: Vec<(RowKey, RowData)>,
    index: HashMap<RowKey, usize>,
}

impl PlateRecord {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert or overwrite the row stored under `key`, returning the previous row
    pub fn upsert_row(&mut self, key: RowKey, row: RowData) -> Option<RowData> {
        match self.index.get(&key) {
            Some(&slot) => Some(std::mem::replace(&mut self.rows[slot].1, row)),
            None => {
                self.index.insert(key.clone(), self.rows.len());
                self.rows.push((key, row));
                None
            }
        }
    }

    pub fn get(&self, key: &RowKey) -> Option<&RowData> {
        self.index.get(key).map(|&slot| &self.rows[slot].1)
    }

    pub fn contains_key(&self, key: &RowKey) -> bool {
        self.index.contains_key(key)
    }

    /// Rows in their current order
    pub fn rows(&self) -> impl Iterator<Item = &RowData> {
        self.rows.iter().map(|(_, row)| row)
    }

    /// Keyed rows in their current order
    pub fn entries(&self) -> impl Iterator<Item = (&RowKey, &RowData)> {
        self.rows.iter().map(|(key, row)| (key, row))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parsed plates partitioned by naming convention, keyed by plate name
#[derive(Debug, Clone, Default)]
pub struct PlateSet {
    pub primary: BTreeMap<String, PlateRecord>,
    pub completion: BTreeMap<String, PlateRecord>,
}

/// Counters reported by a merge run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub files_scanned: usize,
    pub primary_plates: usize,
    pub completion_plates: usize,
    pub rows_overlaid: usize,
    pub rows_skipped: usize,
    pub unmatched_completions: usize,
    pub tables_written: usize,
    pub aggregate_rows: usize,
}

/// Files produced by one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Artifact to hand back to the caller (aggregate CSV or bundle)
    pub artifact: PathBuf,
    pub aggregate_table: PathBuf,
    pub plate_tables: Vec<PathBuf>,
    pub stats: MergeStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> RowData {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_row_key_from_row() {
        let key = RowKey::from_row(&row(&["1", "2", "3", "4", "5"])).unwrap();
        assert_eq!(key.fields(), &row(&["1", "2", "3", "4"])[..]);
        assert_eq!(key.to_string(), "(1, 2, 3, 4)");

        assert!(RowKey::from_row(&row(&["1", "2", "3"])).is_none());
    }

    #[test]
    fn test_row_key_fields_containing_delimiters() {
        let a = RowKey::from_row(&row(&["1, 2", "3", "4", "5"])).unwrap();
        let b = RowKey::from_row(&row(&["1", "2, 3", "4", "5"])).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_upsert_keeps_slot_and_appends_new_keys() {
        let mut plate = PlateRecord::new("Plate 1", row(&["ID", "A", "B", "C", "Col1"]));
        let first = row(&["1", "2", "3", "4", "5"]);
        let second = row(&["5", "6", "7", "8", "9"]);
        plate.upsert_row(RowKey::from_row(&first).unwrap(), first.clone());
        plate.upsert_row(RowKey::from_row(&second).unwrap(), second.clone());

        let replacement = row(&["1", "2", "3", "4", "99"]);
        let previous = plate.upsert_row(RowKey::from_row(&replacement).unwrap(), replacement.clone());
        assert_eq!(previous, Some(first));

        let appended = row(&["9", "9", "9", "9", "1"]);
        assert!(plate
            .upsert_row(RowKey::from_row(&appended).unwrap(), appended.clone())
            .is_none());

        let rows: Vec<_> = plate.rows().cloned().collect();
        assert_eq!(rows, vec![replacement, second, appended]);
        assert_eq!(plate.row_count(), 3);
    }
}
