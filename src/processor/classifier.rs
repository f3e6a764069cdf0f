//! Primary/completion classification
//!
//! Parses every plate file of a batch and partitions the records by name:
//! a plate whose name carries a whitespace-bounded run marker ("Plate I 1")
//! is a completion re-read, everything else is a primary plate.

use super::discovery::FileDiscovery;
use crate::constants::{COMPLETION_MARKER_PATTERN, COMPLETION_MARKER_REPLACEMENT};
use crate::error::Result;
use crate::models::{PlateRecord, PlateSet};
use crate::parser::parse_plate_file;

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

static COMPLETION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(COMPLETION_MARKER_PATTERN).expect("completion marker pattern is valid")
});

/// Whether a plate name marks a completion re-read
pub fn is_completion_name(name: &str) -> bool {
    COMPLETION_MARKER.is_match(name)
}

/// Collapse run markers to recover the primary plate name
pub fn normalize_name(name: &str) -> Cow<'_, str> {
    COMPLETION_MARKER.replace_all(name, COMPLETION_MARKER_REPLACEMENT)
}

/// Result of classifying one directory
#[derive(Debug, Default)]
pub struct Classification {
    pub plates: PlateSet,
    pub files_scanned: usize,
}

/// Parse and classify every plate file below `root`
///
/// Files are processed in path order. When two files of the same set share
/// a plate name, the later file wins.
pub fn classify_directory(
    root: &Path,
    extension: &str,
    show_progress: bool,
) -> Result<Classification> {
    let files = FileDiscovery::new(root).discover(extension)?;

    let pb = if show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut classification = Classification {
        files_scanned: files.len(),
        ..Default::default()
    };

    for file_path in &files {
        if let Some(file_name) = file_path.file_name() {
            pb.set_message(format!("Parsing: {}", file_name.to_string_lossy()));
        }

        let record = parse_plate_file(file_path)?;
        insert_record(&mut classification.plates, record, file_path);
        pb.inc(1);
    }

    pb.finish_and_clear();
    debug!(
        "Classified {} files: {} primary, {} completion plates",
        classification.files_scanned,
        classification.plates.primary.len(),
        classification.plates.completion.len()
    );

    Ok(classification)
}

/// Place one record into its set, replacing any earlier plate of that name
pub fn insert_record(plates: &mut PlateSet, record: PlateRecord, source: &Path) {
    let (set, kind) = if is_completion_name(&record.name) {
        (&mut plates.completion, "completion")
    } else {
        (&mut plates.primary, "primary")
    };

    debug!("{} -> {} plate '{}'", source.display(), kind, record.name);

    if let Some(previous) = set.insert(record.name.clone(), record) {
        warn!(
            "Duplicate {} plate '{}' in {}, replacing earlier file",
            kind,
            previous.name,
            source.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn readout(name: &str, value: &str) -> String {
        format!(
            "h0\nh1\nh2\nName:\t{}\nh4\nh5\nh6\nID\tA\tB\tC\tCol1\n1\t2\t3\t4\t{}\n",
            name, value
        )
    }

    #[test]
    fn test_completion_name_detection() {
        assert!(is_completion_name("Plate I 1"));
        assert!(is_completion_name("Plate II 1"));
        assert!(is_completion_name("Plate\tI\t1"));
        assert!(!is_completion_name("Plate 1"));
        assert!(!is_completion_name("PlateI 1"));
        assert!(!is_completion_name("Plate IX 1"));
        assert!(!is_completion_name("I Plate"));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Plate I 1"), "Plate 1");
        assert_eq!(normalize_name("Plate III 1"), "Plate 1");
        assert_eq!(normalize_name("Plate 1"), "Plate 1");
        assert_eq!(normalize_name("A I B I C"), "A B C");
    }

    #[test]
    fn test_classify_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("run2");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp_dir.path().join("p1.txt"), readout("Plate 1", "5")).unwrap();
        fs::write(nested.join("p1_rerun.txt"), readout("Plate I 1", "99")).unwrap();
        fs::write(temp_dir.path().join("p2.txt"), readout("Plate 2", "7")).unwrap();
        fs::write(temp_dir.path().join("ignored.csv"), "not a plate").unwrap();

        let result = classify_directory(temp_dir.path(), "txt", false).unwrap();

        assert_eq!(result.files_scanned, 3);
        let primary: Vec<_> = result.plates.primary.keys().cloned().collect();
        let completion: Vec<_> = result.plates.completion.keys().cloned().collect();
        assert_eq!(primary, vec!["Plate 1", "Plate 2"]);
        assert_eq!(completion, vec!["Plate I 1"]);
    }

    #[test]
    fn test_completion_plate_never_primary() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), readout("Batch II 4", "1")).unwrap();

        let result = classify_directory(temp_dir.path(), "txt", false).unwrap();

        assert!(result.plates.primary.is_empty());
        assert!(result.plates.completion.contains_key("Batch II 4"));
    }

    #[test]
    fn test_duplicate_plate_name_last_write_wins() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), readout("Plate 1", "first")).unwrap();
        fs::write(temp_dir.path().join("b.txt"), readout("Plate 1", "second")).unwrap();

        let result = classify_directory(temp_dir.path(), "txt", false).unwrap();

        let plate = &result.plates.primary["Plate 1"];
        let values: Vec<_> = plate.rows().map(|r| r[4].clone()).collect();
        assert_eq!(values, vec!["second"]);
    }

    #[test]
    fn test_parse_failure_aborts_classification() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), readout("Plate 1", "1")).unwrap();
        fs::write(temp_dir.path().join("b.txt"), "only\ntwo lines").unwrap();

        let result = classify_directory(temp_dir.path(), "txt", false);

        assert!(matches!(
            result,
            Err(crate::error::PlateError::Parse { .. })
        ));
    }
}
