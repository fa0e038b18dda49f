//! Configuration for the annota client.

use std::time::Duration;

use derive_builder::{Builder, UninitializedFieldError};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tokio::sync::Semaphore;
use url::Url;

use crate::annotator::{DEFAULT_MAX_POLL_DURATION, DEFAULT_POLL_INTERVAL, PollPolicy};
use crate::segment::DEFAULT_MAX_CHUNK_LENGTH;
use crate::{Error, Result};

/// Default base URL of the annotation service.
pub const DEFAULT_BASE_URL: &str = "https://api.annota.dev/";

/// Default timeout of a single HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(1200);

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Format the service is asked to respond in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[non_exhaustive]
pub enum ResponseFormat {
    /// JSON payloads.
    #[default]
    Json,
}

impl ResponseFormat {
    /// MIME type sent in the `Accept` header.
    pub fn mime_type(self) -> &'static str {
        match self {
            ResponseFormat::Json => "application/json",
        }
    }
}

/// Configuration for the annota client.
///
/// Covers the transport (base URL, timeouts) as well as the orchestration
/// policy applied by [`AnnotaClient::annotate`](super::AnnotaClient::annotate).
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use annota_client::AnnotaConfig;
///
/// let config = AnnotaConfig::builder()
///     .with_base_url("http://localhost:8080")?
///     .with_poll_interval(Duration::from_millis(500))
///     .with_max_concurrent_jobs(4usize)
///     .build()?;
///
/// assert_eq!(config.max_concurrent_jobs, Some(4));
/// # Ok::<(), annota_client::Error>(())
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(
    name = "AnnotaBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate_config", error = "Error")
)]
pub struct AnnotaConfig {
    /// Base URL of the annotation service
    #[builder(setter(custom), default = "AnnotaConfig::default_base_url()")]
    pub base_url: Url,
    /// Timeout of a single HTTP request
    #[builder(default = "DEFAULT_REQUEST_TIMEOUT")]
    pub timeout: Duration,
    /// Connection timeout
    #[builder(default = "DEFAULT_CONNECT_TIMEOUT")]
    pub connect_timeout: Duration,
    /// Delay between two status checks of the same job
    #[builder(default = "DEFAULT_POLL_INTERVAL")]
    pub poll_interval: Duration,
    /// Time a job may take to reach a terminal status
    #[builder(default = "DEFAULT_MAX_POLL_DURATION")]
    pub max_poll_duration: Duration,
    /// Maximum chunk length, in characters
    #[builder(default = "DEFAULT_MAX_CHUNK_LENGTH")]
    pub max_chunk_length: usize,
    /// Cap on concurrently running chunk jobs; unbounded when unset
    #[builder(default)]
    pub max_concurrent_jobs: Option<usize>,
    /// Response format requested from the service
    #[builder(default)]
    pub response_format: ResponseFormat,
    /// User agent string for requests
    #[builder(default = "AnnotaConfig::default_user_agent()")]
    pub user_agent: String,
}

impl Default for AnnotaConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_duration: DEFAULT_MAX_POLL_DURATION,
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
            max_concurrent_jobs: None,
            response_format: ResponseFormat::default(),
            user_agent: Self::default_user_agent(),
        }
    }
}

impl AnnotaConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnnotaBuilder {
        AnnotaBuilder::default()
    }

    /// Poll policy derived from this configuration.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: self.poll_interval,
            max_duration: self.max_poll_duration,
        }
    }

    fn default_base_url() -> Url {
        Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")
    }

    fn default_user_agent() -> String {
        format!("annota-client/{}", env!("CARGO_PKG_VERSION"))
    }
}

impl AnnotaBuilder {
    /// Set the base URL of the annotation service.
    ///
    /// A trailing slash is added when missing so that endpoint paths are
    /// resolved below the given path rather than replacing its last segment.
    pub fn with_base_url(mut self, url: &str) -> Result<Self> {
        let mut parsed = Url::parse(url)
            .map_err(|e| Error::config(format!("Invalid base URL '{}': {}", url, e)))?;

        if parsed.cannot_be_a_base() {
            return Err(Error::config(format!("Base URL '{}' cannot be a base", url)));
        }

        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        self.base_url = Some(parsed);
        Ok(self)
    }

    fn validate_config(&self) -> Result<()> {
        let durations = [
            ("Timeout", self.timeout),
            ("Connect timeout", self.connect_timeout),
            ("Poll interval", self.poll_interval),
            ("Max poll duration", self.max_poll_duration),
        ];
        for (name, value) in durations {
            if value.is_some_and(|d| d.is_zero()) {
                return Err(Error::config(format!("{name} must be greater than 0")));
            }
        }

        if self.max_chunk_length == Some(0) {
            return Err(Error::config("Max chunk length must be greater than 0"));
        }

        match self.max_concurrent_jobs {
            Some(Some(0)) => {
                return Err(Error::config("Max concurrent jobs must be greater than 0"));
            }
            Some(Some(limit)) if limit > Semaphore::MAX_PERMITS => {
                return Err(Error::config(format!(
                    "Max concurrent jobs must not exceed {}",
                    Semaphore::MAX_PERMITS
                )));
            }
            _ => {}
        }

        Ok(())
    }
}

impl From<UninitializedFieldError> for Error {
    fn from(err: UninitializedFieldError) -> Self {
        Error::config(err.to_string())
    }
}
