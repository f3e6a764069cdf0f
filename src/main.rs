use clap::Parser;
use plate_merger::cli::{self, Args};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    // Parse command line arguments
    let args = Args::parse();
    cli::setup_logging(&args);

    // Create async runtime and run the merge with signal handling
    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Create cancellation token for stopping the blocking merge
        let cancellation_token = CancellationToken::new();

        let shutdown_signal = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("Failed to install CTRL+C signal handler: {}", e);
                std::future::pending::<()>().await;
            }

            // Stop the merge before it delivers anything
            cancellation_token.cancel();
        };

        tokio::select! {
            result = cli::run(args, cancellation_token.clone()) => result,
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(anyhow::anyhow!("Plate merge interrupted by user"))
            }
        }
    });

    // Drop the runtime so an interrupted merge stops and releases its workspace
    drop(runtime);

    match result {
        Ok(_outcome) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
