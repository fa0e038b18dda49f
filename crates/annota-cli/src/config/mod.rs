//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── input / settled / pretty   # What to annotate and how to print it
//! └── client: ClientConfig       # Credentials, endpoint, polling policy
//! ```
//!
//! All client options can be provided via CLI arguments or environment
//! variables. Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! annota --api-id "..." --api-secret "..." --input notes.txt
//!
//! # Or via environment variables
//! ANNOTA_API_ID="..." ANNOTA_API_SECRET="..." annota < notes.txt
//! ```

mod client;

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
pub use client::ClientConfig;
use tokio::io::AsyncReadExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "annota")]
#[command(about = "Annotate text with the annota service")]
#[command(version)]
pub struct Cli {
    /// File to read the text from. Reads stdin when omitted.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Print one outcome per chunk instead of failing on the first error.
    #[arg(long)]
    pub settled: bool,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,

    /// Annota client configuration.
    #[clap(flatten)]
    pub client: ClientConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    ///
    /// Runs before argument parsing so that clap's `env` fallbacks see the
    /// values from the file.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// Logs are written to stderr; stdout is reserved for results.
    pub fn init_tracing() -> anyhow::Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("info"))
            .context("failed to create env filter")?;

        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .context("failed to initialize tracing")?;

        Ok(())
    }

    /// Reads the text to annotate from the input file or stdin.
    pub async fn read_input(&self) -> anyhow::Result<String> {
        match &self.input {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read input file {}", path.display())),
            None => {
                let mut text = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut text)
                    .await
                    .context("failed to read text from stdin")?;
                Ok(text)
            }
        }
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            input = %self.input.as_ref().map_or("<stdin>".into(), |p| p.display().to_string()),
            settled = self.settled,
            "Input configuration"
        );

        self.client.log();
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
