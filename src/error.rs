//! Error handling for plate merge operations.
//!
//! Covers fixed-layout parse failures, per-plate table emission, aggregation
//! and the upload/workspace plumbing around a merge request.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Directory traversal error: {0}")]
    DirectoryTraversal(#[from] walkdir::Error),

    #[error("Input not found at path: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Invalid plate layout in file: {path} - {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Failed to emit plate table: {path} - {reason}")]
    Emission { path: PathBuf, reason: String },

    #[error("Aggregation failed for: {path} - {reason}")]
    Aggregation { path: PathBuf, reason: String },

    #[error("Upload handling failed for: {path} - {reason}")]
    UploadIo { path: PathBuf, reason: String },

    #[error("Merge interrupted before {stage}")]
    Interrupted { stage: String },
}

impl PlateError {
    /// Create a parse error for a plate file
    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an aggregation error
    pub fn aggregation(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Aggregation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an interruption error naming the stage that did not run
    pub fn interrupted(stage: impl Into<String>) -> Self {
        Self::Interrupted {
            stage: stage.into(),
        }
    }

    /// Create an upload/workspace error
    pub fn upload_io(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::UploadIo {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlateError>;
