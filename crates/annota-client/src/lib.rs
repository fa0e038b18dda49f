#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # annota-client
//!
//! An HTTP client for the annota text annotation service.
//!
//! Long input is split into word-safe chunks, every chunk is submitted as an
//! independent remote job, the jobs are polled concurrently until they reach
//! a terminal status, and the per-chunk results are returned in input order.
//!
//! ## Features
//!
//! - **Segmenter**: splits text into bounded chunks without breaking words
//! - **Job client**: submission and status checks over `reqwest`
//! - **Orchestrator**: concurrent submit-and-poll with per-job time budgets
//! - **Error Handling**: a small, typed error taxonomy
//! - **Observability**: structured logging via `tracing`
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//!
//! use annota_client::{AnnotaClient, ResponseFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), annota_client::Error> {
//!     let client = AnnotaClient::connect(
//!         "my-api-id",
//!         "my-api-secret",
//!         ResponseFormat::Json,
//!         Duration::from_secs(5),
//!     )?;
//!
//!     for result in client.annotate("The quick brown fox.").await? {
//!         println!("{}: {}", result.chunk_index, result.annotation);
//!     }
//!
//!     Ok(())
//! }
//! ```

/// Tracing target for client construction and HTTP calls.
pub const TRACING_TARGET_CLIENT: &str = "annota_client::client";

/// Tracing target for raw HTTP request and response details.
pub const TRACING_TARGET_HTTP: &str = "annota_client::http";

/// Tracing target for job orchestration.
pub const TRACING_TARGET_ANNOTATOR: &str = "annota_client::annotator";

/// Tracing target for text segmentation.
pub const TRACING_TARGET_SEGMENT: &str = "annota_client::segment";

pub mod annotator;
pub mod client;
mod error;
pub mod job;
pub mod provider;
pub mod response;
pub mod segment;

pub use crate::annotator::{Annotator, ChunkOutcome, PollPolicy};
pub use crate::client::{
    AnnotaBuilder, AnnotaClient, AnnotaConfig, Credentials, ResponseFormat,
};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::job::{Job, JobId, JobStatus};
pub use crate::provider::JobProvider;
pub use crate::response::{AnnotationResult, JobPayload, JobState};
pub use crate::segment::{Chunk, DEFAULT_MAX_CHUNK_LENGTH, Segmenter, segment};
