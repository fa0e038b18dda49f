//! HTTP client for the annota service.
//!
//! This module provides the [`AnnotaClient`], its configuration and the
//! credentials it authenticates with.

mod an_client;
mod an_config;
mod credentials;

pub use an_client::AnnotaClient;
pub use an_config::{
    AnnotaBuilder, AnnotaConfig, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_REQUEST_TIMEOUT, ResponseFormat,
};
pub use credentials::Credentials;
