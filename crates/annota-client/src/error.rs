//! Error types for annota-client.

use std::time::Duration;

use strum::{AsRefStr, Display, IntoStaticStr};

use crate::job::JobId;

/// Result type for all annotation operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors, used for logging and matching without
/// destructuring the variant payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Input rejected before any network call.
    InvalidInput,
    /// Service answered with a non-2xx status.
    Http,
    /// Remote job finished in the errored state.
    Annotation,
    /// Poll budget exhausted.
    Timeout,
    /// Service reported a status this client does not know.
    UnknownStatus,
    /// Connection or request failure below the HTTP status level.
    Transport,
    /// 2xx response that could not be understood.
    InvalidResponse,
    /// Invalid client configuration.
    Config,
    /// The caller cancelled the operation.
    Cancelled,
}

/// Errors produced while segmenting, submitting or polling annotation jobs.
///
/// Every variant renders a human-readable message through `Display`, which is
/// what callers should surface to users.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input text or a segmentation parameter was rejected.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of what's invalid
        message: String,
    },

    /// The service returned a status outside `200..=299`.
    #[error("HTTP error (status {status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Message from the structured error body, or the raw body
        message: String,
    },

    /// The remote job reported `ERRORED`.
    #[error("Annotation failed for job {job_id}: {message}")]
    Annotation {
        /// Identifier of the failed job
        job_id: JobId,
        /// Message provided by the service
        message: String,
    },

    /// The job did not reach a terminal status within its poll budget.
    #[error("Job did not complete within {timeout:?}")]
    Timeout {
        /// The exhausted poll budget
        timeout: Duration,
    },

    /// The service reported a status value this client does not recognize.
    #[error("Unknown inference status: {status}")]
    UnknownStatus {
        /// The raw status value
        status: String,
    },

    /// Connection, DNS, TLS or per-request timeout failure.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx response whose body did not match the documented contract.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Description of what's invalid
        message: String,
    },

    /// Configuration errors.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// The operation was cancelled through its cancellation token.
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create an annotation error for the given job
    pub fn annotation(job_id: JobId, message: impl Into<String>) -> Self {
        Self::Annotation {
            job_id,
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    /// Create an unknown status error
    pub fn unknown_status(status: impl Into<String>) -> Self {
        Self::UnknownStatus {
            status: status.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput { .. } => ErrorKind::InvalidInput,
            Error::Http { .. } => ErrorKind::Http,
            Error::Annotation { .. } => ErrorKind::Annotation,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::UnknownStatus { .. } => ErrorKind::UnknownStatus,
            Error::Transport(_) => ErrorKind::Transport,
            Error::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            Error::Config { .. } => ErrorKind::Config,
            Error::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Get the HTTP status code if this is an HTTP or transport error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this is a client-side error (programming/configuration issue)
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::InvalidInput { .. } | Error::Config { .. } => true,
            Error::Http { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }
}
