//! Configuration management for plate merging.
//!
//! Provides the merge configuration threaded explicitly through a request:
//! where per-request workspaces live, which file extensions are scanned and
//! written, and which artifact shape the pipeline produces.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Shape of the artifact returned to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputMode {
    /// Single aggregate CSV table
    #[default]
    FlatTable,
    /// Zip archive holding every per-plate table plus the aggregate table
    ZippedBundle,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" | "flat-table" | "csv" => Ok(OutputMode::FlatTable),
            "bundle" | "zipped-bundle" | "zip" => Ok(OutputMode::ZippedBundle),
            other => Err(format!(
                "unknown output mode '{}' (expected 'flat' or 'bundle')",
                other
            )),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::FlatTable => write!(f, "flat"),
            OutputMode::ZippedBundle => write!(f, "bundle"),
        }
    }
}

/// Configuration for a plate merge request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Parent directory for per-request workspaces
    pub upload_root: PathBuf,

    /// Artifact shape produced by the pipeline
    pub output_mode: OutputMode,

    /// Extension of plate readout files (without the dot)
    pub plate_extension: String,

    /// Extension of emitted per-plate tables (without the dot)
    pub table_extension: String,

    /// Directory name for per-plate tables inside the output directory
    pub tables_dir_name: String,

    /// File name of the aggregate table
    pub aggregate_file_name: String,

    /// File name of the zipped bundle
    pub bundle_file_name: String,

    /// Show a progress bar while parsing plate files
    pub show_progress: bool,

    /// Keep the request workspace on disk instead of deleting it
    pub keep_workspace: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            upload_root: default_upload_root(),
            output_mode: OutputMode::FlatTable,
            plate_extension: "txt".to_string(),
            table_extension: "csv".to_string(),
            tables_dir_name: "csv".to_string(),
            aggregate_file_name: "merged.csv".to_string(),
            bundle_file_name: "merged.zip".to_string(),
            show_progress: false,
            keep_workspace: false,
        }
    }
}

/// Default upload root under the user cache directory
pub fn default_upload_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("plate-merger")
        .join("uploads")
}

impl MergeConfig {
    /// Use a custom upload root
    pub fn with_upload_root(mut self, upload_root: impl Into<PathBuf>) -> Self {
        self.upload_root = upload_root.into();
        self
    }

    /// Select the artifact shape
    pub fn with_output_mode(mut self, output_mode: OutputMode) -> Self {
        self.output_mode = output_mode;
        self
    }

    /// Enable the parsing progress bar
    pub fn with_progress(mut self) -> Self {
        self.show_progress = true;
        self
    }

    /// Keep the request workspace after the request completes
    pub fn with_keep_workspace(mut self) -> Self {
        self.keep_workspace = true;
        self
    }

    /// File name of the artifact for the configured output mode
    pub fn artifact_file_name(&self) -> &str {
        match self.output_mode {
            OutputMode::FlatTable => &self.aggregate_file_name,
            OutputMode::ZippedBundle => &self.bundle_file_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MergeConfig::default();
        assert_eq!(config.output_mode, OutputMode::FlatTable);
        assert_eq!(config.plate_extension, "txt");
        assert_eq!(config.table_extension, "csv");
        assert_eq!(config.artifact_file_name(), "merged.csv");
        assert!(config.upload_root.ends_with("uploads"));
        assert!(!config.keep_workspace);
    }

    #[test]
    fn test_builder_methods() {
        let config = MergeConfig::default()
            .with_upload_root("/tmp/plates")
            .with_output_mode(OutputMode::ZippedBundle)
            .with_progress();

        assert_eq!(config.upload_root, PathBuf::from("/tmp/plates"));
        assert_eq!(config.artifact_file_name(), "merged.zip");
        assert!(config.show_progress);
    }

    #[test]
    fn test_output_mode_parsing() {
        assert_eq!("flat".parse::<OutputMode>(), Ok(OutputMode::FlatTable));
        assert_eq!("Bundle".parse::<OutputMode>(), Ok(OutputMode::ZippedBundle));
        assert_eq!(
            "zipped-bundle".parse::<OutputMode>(),
            Ok(OutputMode::ZippedBundle)
        );
        assert!("parquet".parse::<OutputMode>().is_err());
        assert_eq!(OutputMode::ZippedBundle.to_string(), "bundle");
    }
}
