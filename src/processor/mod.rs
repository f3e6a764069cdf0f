//! Plate merge engine.
//!
//! Runs the whole reconciliation for one extracted batch: classification
//! (parsing included), completion overlay, per-plate table emission,
//! aggregation and, in bundle mode, packaging. The pipeline is synchronous
//! and any stage error aborts the run without producing an artifact. A
//! cancelled run stops at the next stage boundary the same way.

pub mod aggregator;
pub mod bundle;
pub mod classifier;
pub mod discovery;
pub mod emitter;
pub mod merger;

#[cfg(test)]
pub mod tests;

use self::{aggregator::TableAggregator, emitter::TableEmitter};

use crate::config::{MergeConfig, OutputMode};
use crate::error::{PlateError, Result};
use crate::models::{MergeStats, PipelineOutput};

use std::fs;
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Single merge engine, parameterized by [`OutputMode`]
#[derive(Debug, Clone)]
pub struct MergePipeline {
    config: MergeConfig,
    cancellation_token: CancellationToken,
}

impl MergePipeline {
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Stop the run at the next stage boundary once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    fn check_cancelled(&self, stage: &str) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            debug!("Merge cancelled before {}", stage);
            return Err(PlateError::interrupted(stage));
        }
        Ok(())
    }

    /// Merge the plate files below `extracted_dir`, writing results into `output_dir`
    pub fn run(&self, extracted_dir: &Path, output_dir: &Path) -> Result<PipelineOutput> {
        let start_time = Instant::now();
        info!(
            "Merging plates from {} into {}",
            extracted_dir.display(),
            output_dir.display()
        );

        // Step 1: Parse and classify plate files
        self.check_cancelled("classification")?;
        let classification = classifier::classify_directory(
            extracted_dir,
            &self.config.plate_extension,
            self.config.show_progress,
        )?;
        let mut plates = classification.plates;

        let mut stats = MergeStats {
            files_scanned: classification.files_scanned,
            primary_plates: plates.primary.len(),
            completion_plates: plates.completion.len(),
            ..Default::default()
        };

        // Step 2: Overlay completion rows
        self.check_cancelled("completion overlay")?;
        let overlay = merger::apply_completions(&mut plates);
        stats.rows_overlaid = overlay.rows_overlaid;
        stats.rows_skipped = overlay.rows_skipped;
        stats.unmatched_completions = overlay.unmatched_completions;

        // Step 3: Emit per-plate tables
        self.check_cancelled("table emission")?;
        fs::create_dir_all(output_dir)?;
        let tables_dir = output_dir.join(&self.config.tables_dir_name);
        let plate_tables = TableEmitter::new(&tables_dir, &self.config.table_extension)
            .emit_all(plates.primary.values())?;
        stats.tables_written = plate_tables.len();

        // Step 4: Aggregate
        self.check_cancelled("aggregation")?;
        let aggregate_table = output_dir.join(&self.config.aggregate_file_name);
        stats.aggregate_rows = TableAggregator::new(&tables_dir, &self.config.table_extension)
            .aggregate_to(&aggregate_table)?;

        // Step 5: Package
        self.check_cancelled("packaging")?;
        let artifact = match self.config.output_mode {
            OutputMode::FlatTable => aggregate_table.clone(),
            OutputMode::ZippedBundle => {
                let bundle_path = output_dir.join(&self.config.bundle_file_name);
                bundle::write_bundle(&plate_tables, &aggregate_table, &bundle_path)?;
                bundle_path
            }
        };

        debug!("{:?}", stats);
        info!(
            "Merged {} primary plates ({} rows overlaid) into {} in {}ms",
            stats.primary_plates,
            stats.rows_overlaid,
            artifact.display(),
            start_time.elapsed().as_millis()
        );

        Ok(PipelineOutput {
            artifact,
            aggregate_table,
            plate_tables,
            stats,
        })
    }
}
