//! Completion overlay
//!
//! Pairs each completion plate with the primary plate whose name it yields
//! after normalization, then copies the completion's data-bearing rows over
//! the primary's rows. Identifier-only rows (no fields beyond the key) are
//! still missing values and never overwrite anything.

use super::classifier::normalize_name;
use crate::constants::layout::ROW_KEY_FIELDS;
use crate::models::{PlateRecord, PlateSet};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Counters from one overlay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayStats {
    pub rows_overlaid: usize,
    pub rows_skipped: usize,
    pub unmatched_completions: usize,
}

/// Whether a completion row carries data beyond its identifier fields
pub fn is_data_row(row: &[String]) -> bool {
    row.len() > ROW_KEY_FIELDS
}

/// Overlay every completion plate onto its matching primary plate
///
/// Matching goes through an index of normalized completion names, so the
/// pass is linear in the number of plates. Several completions for the same
/// primary are applied in ascending completion-name order; later ones win
/// on overlapping keys.
pub fn apply_completions(plates: &mut PlateSet) -> OverlayStats {
    let mut by_primary_name: HashMap<String, Vec<&PlateRecord>> = HashMap::new();
    for completion in plates.completion.values() {
        by_primary_name
            .entry(normalize_name(&completion.name).into_owned())
            .or_default()
            .push(completion);
    }

    let mut stats = OverlayStats::default();

    for primary in plates.primary.values_mut() {
        let Some(completions) = by_primary_name.remove(&primary.name) else {
            continue;
        };

        for completion in completions {
            let (overlaid, skipped) = overlay(primary, completion);
            debug!(
                "Applied completion '{}' to '{}': {} rows overlaid, {} identifier-only rows skipped",
                completion.name, primary.name, overlaid, skipped
            );
            stats.rows_overlaid += overlaid;
            stats.rows_skipped += skipped;
        }
    }

    for completions in by_primary_name.into_values() {
        for completion in completions {
            warn!(
                "Completion plate '{}' has no primary plate '{}'",
                completion.name,
                normalize_name(&completion.name)
            );
            stats.unmatched_completions += 1;
        }
    }

    stats
}

/// Copy data-bearing rows of `completion` into `primary`, returning
/// (overlaid, skipped) row counts
fn overlay(primary: &mut PlateRecord, completion: &PlateRecord) -> (usize, usize) {
    let mut overlaid = 0;
    let mut skipped = 0;

    for (key, row) in completion.entries() {
        if is_data_row(row) {
            primary.upsert_row(key.clone(), row.clone());
            overlaid += 1;
        } else {
            skipped += 1;
        }
    }

    (overlaid, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RowData, RowKey};

    fn row(fields: &[&str]) -> RowData {
        fields.iter().map(|f| f.to_string()).collect()
    }

    fn plate(name: &str, rows: &[&[&str]]) -> PlateRecord {
        let mut record = PlateRecord::new(name, row(&["ID", "A", "B", "C", "Col1"]));
        for r in rows {
            let data = row(r);
            record.upsert_row(RowKey::from_row(&data).unwrap(), data);
        }
        record
    }

    fn plate_set(primary: Vec<PlateRecord>, completion: Vec<PlateRecord>) -> PlateSet {
        PlateSet {
            primary: primary.into_iter().map(|p| (p.name.clone(), p)).collect(),
            completion: completion.into_iter().map(|p| (p.name.clone(), p)).collect(),
        }
    }

    fn key(fields: &[&str]) -> RowKey {
        RowKey::from_row(&row(fields)).unwrap()
    }

    #[test]
    fn test_completion_row_overwrites_primary_row() {
        let mut plates = plate_set(
            vec![plate("Plate 1", &[&["1", "2", "3", "4", "5"]])],
            vec![plate("Plate I 1", &[&["1", "2", "3", "4", "99"]])],
        );

        let stats = apply_completions(&mut plates);

        let merged = &plates.primary["Plate 1"];
        assert_eq!(
            merged.get(&key(&["1", "2", "3", "4"])).unwrap(),
            &row(&["1", "2", "3", "4", "99"])
        );
        assert_eq!(merged.row_count(), 1);
        assert_eq!(stats.rows_overlaid, 1);
        assert_eq!(stats.rows_skipped, 0);
    }

    #[test]
    fn test_identifier_only_row_is_skipped() {
        let mut plates = plate_set(
            vec![plate("Plate 1", &[&["1", "2", "3", "4", "5"]])],
            vec![plate(
                "Plate I 1",
                &[&["5", "6", "7", "8"], &["1", "2", "3", "4"]],
            )],
        );

        let stats = apply_completions(&mut plates);

        let merged = &plates.primary["Plate 1"];
        assert!(!merged.contains_key(&key(&["5", "6", "7", "8"])));
        assert_eq!(
            merged.get(&key(&["1", "2", "3", "4"])).unwrap(),
            &row(&["1", "2", "3", "4", "5"])
        );
        assert_eq!(stats.rows_skipped, 2);
        assert_eq!(stats.rows_overlaid, 0);
    }

    #[test]
    fn test_new_keys_are_appended_and_existing_keep_slot() {
        let mut plates = plate_set(
            vec![plate(
                "Plate 1",
                &[&["1", "1", "1", "1", "a"], &["2", "2", "2", "2", "b"]],
            )],
            vec![plate(
                "Plate I 1",
                &[&["3", "3", "3", "3", "c"], &["1", "1", "1", "1", "z"]],
            )],
        );

        apply_completions(&mut plates);

        let values: Vec<_> = plates.primary["Plate 1"]
            .rows()
            .map(|r| r[4].clone())
            .collect();
        assert_eq!(values, vec!["z", "b", "c"]);
    }

    #[test]
    fn test_later_completion_wins() {
        let mut plates = plate_set(
            vec![plate("Plate 1", &[&["1", "2", "3", "4", "5"]])],
            vec![
                plate("Plate I 1", &[&["1", "2", "3", "4", "first"]]),
                plate("Plate II 1", &[&["1", "2", "3", "4", "second"]]),
            ],
        );

        let stats = apply_completions(&mut plates);

        assert_eq!(
            plates.primary["Plate 1"].get(&key(&["1", "2", "3", "4"])).unwrap()[4],
            "second"
        );
        assert_eq!(stats.rows_overlaid, 2);
    }

    #[test]
    fn test_completion_only_touches_its_primary() {
        let mut plates = plate_set(
            vec![
                plate("Plate 1", &[&["1", "2", "3", "4", "5"]]),
                plate("Plate 2", &[&["1", "2", "3", "4", "6"]]),
            ],
            vec![
                plate("Plate I 2", &[&["1", "2", "3", "4", "60"]]),
                plate("Plate I 9", &[&["1", "2", "3", "4", "90"]]),
            ],
        );

        let stats = apply_completions(&mut plates);

        assert_eq!(plates.primary["Plate 1"].get(&key(&["1", "2", "3", "4"])).unwrap()[4], "5");
        assert_eq!(plates.primary["Plate 2"].get(&key(&["1", "2", "3", "4"])).unwrap()[4], "60");
        assert_eq!(stats.unmatched_completions, 1);
    }

    #[test]
    fn test_is_data_row() {
        assert!(is_data_row(&row(&["1", "2", "3", "4", ""])));
        assert!(!is_data_row(&row(&["1", "2", "3", "4"])));
    }
}
