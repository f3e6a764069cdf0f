//! File discovery for plate batches
//!
//! Recursively collects files with a given extension below a root directory.
//! Results are sorted by path so every later stage sees the same order on
//! every run, independent of filesystem traversal order. Hidden entries
//! (names starting with `.`) below the root are skipped along with
//! everything inside hidden directories, so archive metadata such as
//! AppleDouble `._*` files never reaches the parser.

use crate::error::{PlateError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Recursive file discovery below one root directory
#[derive(Debug)]
pub struct FileDiscovery {
    root: PathBuf,
}

impl FileDiscovery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Discover every file with `extension` (without the dot), sorted by path
    pub fn discover(&self, extension: &str) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(PlateError::InputNotFound {
                path: self.root.clone(),
            });
        }

        debug!(
            "Searching for *.{} files in: {}",
            extension,
            self.root.display()
        );

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && has_extension(entry.path(), extension) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        debug!("Found {} *.{} files", files.len(), extension);

        Ok(files)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Check a path's extension (case sensitive)
fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}
