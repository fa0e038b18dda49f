//! Annota client configuration.

use std::fmt;
use std::time::Duration;

use annota_client::client::DEFAULT_BASE_URL;
use annota_client::{
    AnnotaClient, AnnotaConfig, Credentials, DEFAULT_MAX_CHUNK_LENGTH, ResponseFormat,
};
use clap::Args;

use crate::TRACING_TARGET_CONFIG;

/// Credentials, endpoint and polling policy of the annota client.
///
/// # Environment Variables
///
/// - `ANNOTA_API_ID` - API identifier (required)
/// - `ANNOTA_API_SECRET` - API secret (required)
/// - `ANNOTA_BASE_URL` - Service base URL
/// - `ANNOTA_REQUEST_TIMEOUT_MS` - Timeout of a single HTTP request (default: 1200)
/// - `ANNOTA_POLL_INTERVAL_SECS` - Delay between status checks (default: 2)
/// - `ANNOTA_MAX_POLL_DURATION_SECS` - Budget of a single job (default: 300)
/// - `ANNOTA_MAX_CHUNK_LENGTH` - Maximum chunk length in characters (default: 10000)
/// - `ANNOTA_MAX_CONCURRENT_JOBS` - Cap on jobs in flight (default: unbounded)
#[derive(Clone, Args)]
#[must_use = "config does nothing unless you use it"]
pub struct ClientConfig {
    /// API identifier sent as `x-api-id`.
    #[arg(long, env = "ANNOTA_API_ID", hide_env_values = true)]
    pub api_id: String,

    /// API secret sent as `x-api-secret`.
    #[arg(long, env = "ANNOTA_API_SECRET", hide_env_values = true)]
    pub api_secret: String,

    /// Base URL of the annotation service.
    #[arg(long, env = "ANNOTA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Timeout of a single HTTP request, in milliseconds.
    #[arg(long, env = "ANNOTA_REQUEST_TIMEOUT_MS", default_value_t = 1200)]
    pub request_timeout_ms: u64,

    /// Delay between two status checks of the same job, in seconds.
    #[arg(long, env = "ANNOTA_POLL_INTERVAL_SECS", default_value_t = 2)]
    pub poll_interval_secs: u64,

    /// Time a single job may take to complete, in seconds.
    #[arg(long, env = "ANNOTA_MAX_POLL_DURATION_SECS", default_value_t = 300)]
    pub max_poll_duration_secs: u64,

    /// Maximum chunk length, in characters.
    #[arg(long, env = "ANNOTA_MAX_CHUNK_LENGTH", default_value_t = DEFAULT_MAX_CHUNK_LENGTH)]
    pub max_chunk_length: usize,

    /// Cap on concurrently running jobs. Unbounded when omitted.
    #[arg(long, env = "ANNOTA_MAX_CONCURRENT_JOBS")]
    pub max_concurrent_jobs: Option<usize>,

    /// Response format requested from the service.
    #[arg(long, env = "ANNOTA_RESPONSE_FORMAT", default_value_t = ResponseFormat::Json)]
    pub response_format: ResponseFormat,
}

impl ClientConfig {
    /// Builds the client configuration.
    pub fn annota_config(&self) -> anyhow::Result<AnnotaConfig> {
        let mut builder = AnnotaConfig::builder()
            .with_base_url(&self.base_url)?
            .with_timeout(Duration::from_millis(self.request_timeout_ms))
            .with_poll_interval(Duration::from_secs(self.poll_interval_secs))
            .with_max_poll_duration(Duration::from_secs(self.max_poll_duration_secs))
            .with_max_chunk_length(self.max_chunk_length)
            .with_response_format(self.response_format);

        if let Some(limit) = self.max_concurrent_jobs {
            builder = builder.with_max_concurrent_jobs(limit);
        }

        Ok(builder.build()?)
    }

    /// Builds the annota client.
    pub fn build_client(&self) -> anyhow::Result<AnnotaClient> {
        let credentials = Credentials::new(self.api_id.clone(), self.api_secret.clone());
        let client = AnnotaClient::new(self.annota_config()?, credentials)?;
        Ok(client)
    }

    /// Logs the configuration without credentials.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            base_url = %self.base_url,
            request_timeout_ms = self.request_timeout_ms,
            poll_interval_secs = self.poll_interval_secs,
            max_poll_duration_secs = self.max_poll_duration_secs,
            max_chunk_length = self.max_chunk_length,
            max_concurrent_jobs = ?self.max_concurrent_jobs,
            response_format = %self.response_format,
            "Client configuration"
        );
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_id", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("max_poll_duration_secs", &self.max_poll_duration_secs)
            .field("max_chunk_length", &self.max_chunk_length)
            .field("max_concurrent_jobs", &self.max_concurrent_jobs)
            .field("response_format", &self.response_format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[clap(flatten)]
        client: ClientConfig,
    }

    fn parse(args: &[&str]) -> ClientConfig {
        let base = ["test", "--api-id", "id", "--api-secret", "secret"];
        TestCli::try_parse_from(base.iter().chain(args).copied())
            .unwrap()
            .client
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--base-url", "http://localhost:8080"]).annota_config().unwrap();

        assert_eq!(config.timeout, Duration::from_millis(1200));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.max_poll_duration, Duration::from_secs(300));
        assert_eq!(config.max_chunk_length, DEFAULT_MAX_CHUNK_LENGTH);
        assert_eq!(config.max_concurrent_jobs, None);
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "--base-url",
            "http://localhost:8080",
            "--request-timeout-ms",
            "5000",
            "--max-chunk-length",
            "200",
            "--max-concurrent-jobs",
            "4",
            "--response-format",
            "JSON",
        ])
        .annota_config()
        .unwrap();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_chunk_length, 200);
        assert_eq!(config.max_concurrent_jobs, Some(4));
        assert_eq!(config.response_format, ResponseFormat::Json);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let config = parse(&["--base-url", "http://localhost", "--poll-interval-secs", "0"]);
        assert!(config.annota_config().is_err());

        let config = parse(&["--base-url", "not a url"]);
        assert!(config.build_client().is_err());
    }

    #[test]
    fn test_debug_hides_credentials() {
        let config = parse(&["--base-url", "http://localhost"]);
        let debug = format!("{config:?}");
        assert!(!debug.contains("\"secret\""));
        assert!(!debug.contains("\"id\""));
        assert!(debug.contains("<redacted>"));
    }
}
