//! s3-walker - Parallel S3 Bucket Enumerator
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use s3_walker::client::AwsObjectStore;
use s3_walker::config::CliArgs;
use s3_walker::walker::{list_flat, BucketWalker, ObjectStream};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let store = Arc::new(
        AwsObjectStore::connect(
            &args.credential_source(),
            args.region.clone(),
            args.endpoint_url.clone(),
        )
        .await,
    );

    let config = args.list_config();

    let mut stream: ObjectStream = if args.flat {
        list_flat(store, config)
    } else {
        let walker = BucketWalker::new(store, config);

        // Ctrl-C cancels the walk; the stream then ends with a sentinel.
        let shutdown = walker.shutdown_flag();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupt received, shutting down...");
                shutdown.store(true, Ordering::SeqCst);
            }
        });

        walker.start()
    };

    let mut count: u64 = 0;
    while let Some(event) = stream.next().await {
        let record = event.context("enumeration failed")?;
        println!("{}", record.key);
        count += 1;
    }

    if !args.quiet {
        info!(objects = count, "listing complete");
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("s3_walker=debug,warn")
    } else {
        EnvFilter::new("s3_walker=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
