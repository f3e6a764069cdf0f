//! Request-level driver.
//!
//! Ties one merge request together: acquire a workspace, unpack the upload,
//! run the merge engine, deliver the artifact, release the workspace.
//! Cancellation is honoured up to the final rename into the destination, so
//! an interrupted request leaves nothing behind.

use crate::archive::{extract_zip, is_zip_archive};
use crate::config::MergeConfig;
use crate::error::{PlateError, Result};
use crate::models::MergeStats;
use crate::processor::MergePipeline;
use crate::workspace::{RequestId, RequestWorkspace};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Result of one completed request
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub request_id: RequestId,
    pub delivered: PathBuf,
    pub stats: MergeStats,
}

/// Merge the plates of `input` (a directory or a zip archive) and deliver the
/// artifact to `destination`
///
/// The request workspace is removed on every exit path unless
/// `config.keep_workspace` is set.
pub fn process_request(
    config: &MergeConfig,
    input: &Path,
    destination: &Path,
) -> Result<RequestOutcome> {
    process_request_cancellable(config, input, destination, &CancellationToken::new())
}

/// [`process_request`] that stops without delivering once `cancellation_token` is cancelled
pub fn process_request_cancellable(
    config: &MergeConfig,
    input: &Path,
    destination: &Path,
    cancellation_token: &CancellationToken,
) -> Result<RequestOutcome> {
    let workspace = RequestWorkspace::create(&config.upload_root)?;
    let request_id = workspace.id();
    info!("Request {} started for {}", request_id, input.display());

    let result = run_in_workspace(config, &workspace, input, destination, cancellation_token);
    if let Err(PlateError::Interrupted { stage }) = &result {
        warn!("Request {} interrupted before {}", request_id, stage);
    }

    if config.keep_workspace {
        let kept = workspace.persist();
        info!("Request {} workspace kept at {}", request_id, kept.display());
    }

    let (delivered, stats) = result?;
    info!("Request {} delivered {}", request_id, delivered.display());

    Ok(RequestOutcome {
        request_id,
        delivered,
        stats,
    })
}

fn run_in_workspace(
    config: &MergeConfig,
    workspace: &RequestWorkspace,
    input: &Path,
    destination: &Path,
    cancellation_token: &CancellationToken,
) -> Result<(PathBuf, MergeStats)> {
    let source_dir = if is_zip_archive(input) {
        let extracted_dir = workspace.extracted_dir();
        extract_zip(input, &extracted_dir)?;
        extracted_dir
    } else if input.is_dir() {
        input.to_path_buf()
    } else {
        return Err(PlateError::InputNotFound {
            path: input.to_path_buf(),
        });
    };

    let output = MergePipeline::new(config.clone())
        .with_cancellation(cancellation_token.clone())
        .run(&source_dir, &workspace.output_dir())?;

    deliver(&output.artifact, destination, cancellation_token)?;

    Ok((destination.to_path_buf(), output.stats))
}

/// Copy the artifact out of the workspace
///
/// The copy lands in a temporary file beside `destination` and is renamed
/// into place only if the request is still active.
fn deliver(
    artifact: &Path,
    destination: &Path,
    cancellation_token: &CancellationToken,
) -> Result<()> {
    if cancellation_token.is_cancelled() {
        return Err(PlateError::interrupted("delivery"));
    }

    let parent = match destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };

    let staged = NamedTempFile::new_in(parent)?;
    fs::copy(artifact, staged.path())?;

    if cancellation_token.is_cancelled() {
        return Err(PlateError::interrupted("delivery"));
    }
    staged
        .persist(destination)
        .map_err(|e| PlateError::upload_io(destination, e.error.to_string()))?;
    Ok(())
}
