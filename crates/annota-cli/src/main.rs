#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod output;

use std::process;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "annota_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "annota_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "annota_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::debug!(
            target: TRACING_TARGET_SHUTDOWN,
            "annotation finished successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "annotation terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing()?;
    cli.log();

    let text = cli.read_input().await?;
    let client = cli
        .client
        .build_client()
        .context("failed to create annota client")?;
    let annotator = client
        .annotator()
        .context("failed to create annotator")?;

    if cli.settled {
        let outcomes = annotator.annotate_settled(&text).await?;
        output::write_outcomes(&outcomes, cli.pretty)?;
        return Ok(());
    }

    let token = CancellationToken::new();
    tokio::spawn(cancel_on_interrupt(token.clone()));

    let results = annotator.annotate_with_cancellation(&text, &token).await?;
    output::write_results(&results, cli.pretty)?;

    Ok(())
}

/// Cancels `token` on the first Ctrl-C.
async fn cancel_on_interrupt(token: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!(
            target: TRACING_TARGET_SHUTDOWN,
            "interrupt received, cancelling in-flight jobs"
        );
        token.cancel();
    }
}
