//! Annota HTTP client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use super::{AnnotaConfig, Credentials, ResponseFormat};
use crate::annotator::Annotator;
use crate::job::JobId;
use crate::provider::JobProvider;
use crate::response::{AnnotationResult, JobPayload, SubmitRequest, SubmitResponse, http_error};
use crate::{Error, Result, TRACING_TARGET_CLIENT, TRACING_TARGET_HTTP};

/// Header carrying the API identifier.
const API_ID_HEADER: HeaderName = HeaderName::from_static("x-api-id");

/// Header carrying the API secret.
const API_SECRET_HEADER: HeaderName = HeaderName::from_static("x-api-secret");

/// Path of the job collection, relative to the base URL.
const ANNOTATIONS_PATH: &str = "v1/annotations";

/// Inner client that holds the HTTP client and configuration.
struct AnnotaClientInner {
    http: Client,
    config: AnnotaConfig,
    annotations_url: Url,
}

/// HTTP client for the annota annotation service.
///
/// Cloning is cheap; clones share one connection pool. Credentials are
/// installed as default headers when the client is built and are not
/// retained anywhere else.
///
/// # Examples
///
/// ```ignore
/// use annota_client::{AnnotaClient, AnnotaConfig, Credentials};
///
/// let config = AnnotaConfig::builder()
///     .with_base_url("http://localhost:8080")?
///     .build()?;
/// let client = AnnotaClient::new(config, Credentials::new("id", "secret"))?;
///
/// let results = client.annotate("Some long text ...").await?;
/// ```
#[derive(Clone)]
pub struct AnnotaClient {
    inner: Arc<AnnotaClientInner>,
}

impl std::fmt::Debug for AnnotaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotaClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl AnnotaClient {
    /// Create a new client with the given configuration and credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the credentials are empty or cannot be
    /// sent as header values, or if the HTTP client cannot be built.
    pub fn new(config: AnnotaConfig, credentials: Credentials) -> Result<Self> {
        if credentials.is_incomplete() {
            return Err(Error::config("API id and API secret must not be empty"));
        }

        let headers = Self::default_headers(&credentials, config.response_format)?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let annotations_url = config
            .base_url
            .join(ANNOTATIONS_PATH)
            .map_err(|e| Error::config(format!("Failed to construct API URL: {}", e)))?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            base_url = %config.base_url,
            timeout = ?config.timeout,
            response_format = %config.response_format,
            "Annota client initialized"
        );

        let inner = AnnotaClientInner {
            http,
            config,
            annotations_url,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Create a client with default settings apart from the request timeout.
    ///
    /// # Arguments
    ///
    /// * `api_id` - API identifier, sent as `x-api-id`
    /// * `api_secret` - API secret, sent as `x-api-secret`
    /// * `response_format` - Format requested from the service
    /// * `timeout` - Timeout of each individual HTTP request
    pub fn connect(
        api_id: impl Into<String>,
        api_secret: impl Into<String>,
        response_format: ResponseFormat,
        timeout: Duration,
    ) -> Result<Self> {
        let config = AnnotaConfig::builder()
            .with_response_format(response_format)
            .with_timeout(timeout)
            .build()?;

        Self::new(config, Credentials::new(api_id, api_secret))
    }

    /// Get the client configuration.
    pub fn config(&self) -> &AnnotaConfig {
        &self.inner.config
    }

    /// Builds an [`Annotator`] over this client using the configured policy.
    pub fn annotator(&self) -> Result<Annotator<Self>> {
        Annotator::from_config(self.clone(), self.config())
    }

    /// Annotates `text`, returning one result per chunk in input order.
    ///
    /// See [`Annotator::annotate`] for the full contract.
    pub async fn annotate(&self, text: &str) -> Result<Vec<AnnotationResult>> {
        self.annotator()?.annotate(text).await
    }

    fn default_headers(
        credentials: &Credentials,
        response_format: ResponseFormat,
    ) -> Result<HeaderMap> {
        let mut api_id = HeaderValue::from_str(credentials.api_id())
            .map_err(|_| Error::config("API id is not a valid header value"))?;
        api_id.set_sensitive(true);

        let mut api_secret = HeaderValue::from_str(credentials.api_secret())
            .map_err(|_| Error::config("API secret is not a valid header value"))?;
        api_secret.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static(response_format.mime_type()));
        headers.insert(API_ID_HEADER, api_id);
        headers.insert(API_SECRET_HEADER, api_secret);
        Ok(headers)
    }

    fn job_url(&self, job_id: &JobId) -> Result<Url> {
        let mut url = self.inner.annotations_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config("Base URL cannot be a base"))?
            .push(job_id.as_str());
        Ok(url)
    }

    /// Decodes a 2xx body as `T`, or converts the response into an error.
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        tracing::debug!(
            target: TRACING_TARGET_HTTP,
            status = status.as_u16(),
            url = %response.url(),
            "Received response"
        );

        if !status.is_success() {
            let body = response.text().await.ok();
            let error = http_error(status, body.as_deref());
            tracing::warn!(
                target: TRACING_TARGET_HTTP,
                status = status.as_u16(),
                error = %error,
                "Request rejected"
            );
            return Err(error);
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            Error::invalid_response(format!("Failed to parse response body: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl JobProvider for AnnotaClient {
    async fn submit(&self, text: &str) -> Result<JobId> {
        let url = self.inner.annotations_url.clone();

        tracing::debug!(
            target: TRACING_TARGET_HTTP,
            url = %url,
            text_bytes = text.len(),
            "Submitting annotation job"
        );

        let response = self
            .inner
            .http
            .post(url)
            .json(&SubmitRequest { text })
            .send()
            .await?;

        let SubmitResponse { request_id } = Self::read_json(response).await?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            job_id = %request_id,
            "Annotation job submitted"
        );

        Ok(request_id)
    }

    async fn status(&self, job_id: &JobId) -> Result<JobPayload> {
        let url = self.job_url(job_id)?;

        tracing::trace!(
            target: TRACING_TARGET_HTTP,
            url = %url,
            job_id = %job_id,
            "Checking job status"
        );

        let response = self.inner.http.get(url).send().await?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> AnnotaClient {
        let config = AnnotaConfig::builder()
            .with_base_url(base_url)
            .unwrap()
            .build()
            .unwrap();
        AnnotaClient::new(config, Credentials::new("id", "secret")).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = AnnotaClient::connect(
            "id",
            "secret",
            ResponseFormat::Json,
            Duration::from_secs(3),
        );
        assert!(client.is_ok());
        assert_eq!(client.unwrap().config().timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_client_rejects_empty_credentials() {
        let result = AnnotaClient::new(AnnotaConfig::default(), Credentials::new("", "secret"));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_client_rejects_invalid_header_values() {
        let result = AnnotaClient::new(
            AnnotaConfig::default(),
            Credentials::new("id", "multi\nline"),
        );
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let client = AnnotaClient::connect(
            "visible-id",
            "visible-secret",
            ResponseFormat::Json,
            Duration::from_secs(1),
        )
        .unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("visible-id"));
        assert!(!debug.contains("visible-secret"));
    }

    #[test]
    fn test_endpoint_urls() {
        let client = client("http://localhost:8080/api");
        assert_eq!(
            client.inner.annotations_url.as_str(),
            "http://localhost:8080/api/v1/annotations"
        );
        assert_eq!(
            client.job_url(&JobId::new("req-42")).unwrap().as_str(),
            "http://localhost:8080/api/v1/annotations/req-42"
        );
    }

    #[test]
    fn test_job_url_escapes_identifier() {
        let client = client("http://localhost:8080");
        let url = client.job_url(&JobId::new("a/b c")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v1/annotations/a%2Fb%20c");
    }
}
