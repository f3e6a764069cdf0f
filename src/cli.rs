//! Command-line interface components.

use crate::config::{MergeConfig, OutputMode};
use crate::request::{RequestOutcome, process_request_cancellable};
use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "plate-merger")]
#[command(about = "Merge plate readout files, applying completion re-reads, into one CSV table")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Directory of plate readout files, or a zip archive of them
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Where to write the result (defaults to ./merged.csv or ./merged.zip)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output mode: flat (aggregate CSV) or bundle (zip of per-plate and aggregate tables)
    #[arg(long, default_value = "flat")]
    pub mode: OutputMode,

    /// Parent directory for per-request working directories
    #[arg(long)]
    pub upload_root: Option<PathBuf>,

    /// Keep the request working directory for inspection
    #[arg(long)]
    pub keep_workspace: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Build the merge configuration from the arguments
    pub fn to_config(&self) -> MergeConfig {
        let mut config = MergeConfig::default().with_output_mode(self.mode);
        if let Some(upload_root) = &self.upload_root {
            config = config.with_upload_root(upload_root);
        }
        if self.keep_workspace {
            config = config.with_keep_workspace();
        }
        if !self.quiet {
            config = config.with_progress();
        }
        config
    }

    /// Destination of the artifact, defaulting to the artifact name in the current directory
    pub fn get_output_path(&self, config: &MergeConfig) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(config.artifact_file_name()))
    }

    pub fn get_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// Set up structured logging based on CLI arguments
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plate_merger={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}

/// Run one merge request; every failure surfaces as a single error with its cause
///
/// Cancelling `cancellation_token` stops the blocking merge at its next
/// stage boundary, before anything is delivered.
pub async fn run(args: Args, cancellation_token: CancellationToken) -> Result<RequestOutcome> {
    let config = args.to_config();
    let destination = args.get_output_path(&config);
    let input = args.input.clone();

    println!("{}", "Starting plate merge".bright_green().bold());
    println!("  {} {}", "Input:".bright_cyan(), input.display());
    println!("  {} {}", "Output:".bright_cyan(), destination.display());
    println!("  {} {}", "Mode:".bright_cyan(), config.output_mode);

    let outcome = tokio::task::spawn_blocking(move || {
        process_request_cancellable(&config, &input, &destination, &cancellation_token)
    })
    .await
    .context("Plate merge task failed")?
    .context("Plate merge failed")?;

    report(&outcome);
    Ok(outcome)
}

fn report(outcome: &RequestOutcome) {
    let stats = &outcome.stats;
    println!("\n{}", "Merge Summary".bright_green().bold());
    println!(
        "  {} {}",
        "Request:".bright_cyan(),
        outcome.request_id.to_string().bright_white()
    );
    println!(
        "  {} {} ({} primary, {} completion)",
        "Plate files:".bright_cyan(),
        stats.files_scanned.to_string().bright_white(),
        stats.primary_plates,
        stats.completion_plates
    );
    println!(
        "  {} {} overlaid, {} identifier-only skipped",
        "Completion rows:".bright_cyan(),
        stats.rows_overlaid.to_string().bright_white(),
        stats.rows_skipped
    );
    if stats.unmatched_completions > 0 {
        println!(
            "  {} {}",
            "Unmatched completions:".bright_yellow(),
            stats.unmatched_completions.to_string().bright_yellow().bold()
        );
    }
    println!(
        "  {} {}",
        "Aggregate rows:".bright_cyan(),
        stats.aggregate_rows.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Written:".bright_cyan(),
        outcome.delivered.display()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_args() {
        let args = Args::try_parse_from(["plate-merger", "plates.zip"]).unwrap();

        assert_eq!(args.input, PathBuf::from("plates.zip"));
        assert_eq!(args.mode, OutputMode::FlatTable);
        assert_eq!(args.get_log_level(), "info");

        let config = args.to_config();
        assert_eq!(args.get_output_path(&config), PathBuf::from("merged.csv"));
        assert!(config.show_progress);
    }

    #[test]
    fn test_parse_bundle_args() {
        let args = Args::try_parse_from([
            "plate-merger",
            "batch",
            "--mode",
            "bundle",
            "--upload-root",
            "/tmp/uploads",
            "--keep-workspace",
            "-q",
        ])
        .unwrap();

        let config = args.to_config();
        assert_eq!(config.output_mode, OutputMode::ZippedBundle);
        assert_eq!(config.upload_root, PathBuf::from("/tmp/uploads"));
        assert!(config.keep_workspace);
        assert!(!config.show_progress);
        assert_eq!(args.get_output_path(&config), PathBuf::from("merged.zip"));
        assert_eq!(args.get_log_level(), "warn");
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Args::try_parse_from(["plate-merger", "batch", "-v", "-q"]).is_err());
        assert!(Args::try_parse_from(["plate-merger", "batch", "--mode", "parquet"]).is_err());
    }
}
