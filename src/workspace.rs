//! Per-request working directories.
//!
//! Each merge request owns one directory below the upload root, named by a
//! UTC timestamp plus a random request id so concurrent requests never share
//! a directory. The directory is removed when the workspace is dropped,
//! whichever way the request ends.

use crate::constants::{EXTRACTED_DIR_NAME, OUTPUT_DIR_NAME, WORKSPACE_TIMESTAMP_FORMAT};
use crate::error::{PlateError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};
use uuid::Uuid;

/// Unique identifier of one merge request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scoped working directory of one request
#[derive(Debug)]
pub struct RequestWorkspace {
    id: RequestId,
    dir: Option<TempDir>,
    path: PathBuf,
}

impl RequestWorkspace {
    /// Create a fresh workspace below `upload_root`
    pub fn create(upload_root: &Path) -> Result<Self> {
        fs::create_dir_all(upload_root).map_err(|e| {
            PlateError::upload_io(upload_root, format!("cannot create upload root: {}", e))
        })?;

        let id = RequestId::new();
        let name = format!("{}-{}", Utc::now().format(WORKSPACE_TIMESTAMP_FORMAT), id);

        let dir = tempfile::Builder::new()
            .prefix(&name)
            .rand_bytes(0)
            .tempdir_in(upload_root)
            .map_err(|e| {
                PlateError::upload_io(upload_root.join(&name), format!("cannot create workspace: {}", e))
            })?;
        let path = dir.path().to_path_buf();

        for sub_dir in [EXTRACTED_DIR_NAME, OUTPUT_DIR_NAME] {
            fs::create_dir(path.join(sub_dir)).map_err(|e| {
                PlateError::upload_io(path.join(sub_dir), format!("cannot create workspace: {}", e))
            })?;
        }

        debug!("Created workspace {} for request {}", path.display(), id);

        Ok(Self {
            id,
            dir: Some(dir),
            path,
        })
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory receiving the extracted upload
    pub fn extracted_dir(&self) -> PathBuf {
        self.path.join(EXTRACTED_DIR_NAME)
    }

    /// Directory receiving pipeline output
    pub fn output_dir(&self) -> PathBuf {
        self.path.join(OUTPUT_DIR_NAME)
    }

    /// Keep the directory on disk after the workspace is dropped
    pub fn persist(mut self) -> PathBuf {
        if let Some(dir) = self.dir.take() {
            let _ = dir.keep();
        }
        debug!("Keeping workspace {}", self.path.display());
        self.path.clone()
    }
}

impl Drop for RequestWorkspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => debug!("Released workspace {} ({})", self.path.display(), self.id),
                Err(e) => warn!("Failed to remove workspace {}: {}", self.path.display(), e),
            }
        }
    }
}
