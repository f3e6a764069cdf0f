//! Plate Merger Library
//!
//! Reconciles batches of fixed-layout, tab-delimited plate reader exports
//! into one merged CSV table.
//!
//! This library provides tools for:
//! - Parsing plate readouts by fixed line/field offsets
//! - Separating primary plates from completion re-reads by name
//! - Overlaying completion rows onto their primary plate
//! - Writing per-plate CSV tables and one aggregate table (or a zip bundle)
//! - Running each request in its own scoped working directory

pub mod archive;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod parser;
pub mod processor;
pub mod request;
pub mod workspace;

pub use config::{MergeConfig, OutputMode};
pub use error::{PlateError, Result};
pub use models::{MergeStats, PipelineOutput, PlateRecord, PlateSet, RowData, RowKey};
pub use processor::MergePipeline;
pub use request::{RequestOutcome, process_request, process_request_cancellable};
