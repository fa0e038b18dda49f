//! Wire payloads and their normalization.
//!
//! Everything the service sends is decoded into the structs in this module
//! and then validated into [`JobState`]. Untyped JSON never travels past this
//! boundary except as the opaque annotation payload itself.

use std::str::FromStr;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::job::{JobId, JobStatus};
use crate::{Error, Result};

/// Message used when an errored job carries no message of its own.
const DEFAULT_ERRORED_MESSAGE: &str = "annotation job failed";

/// Body of a job submission request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SubmitRequest<'a> {
    pub text: &'a str,
}

/// Body of a successful job submission response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubmitResponse {
    pub request_id: JobId,
}

/// Structured error body returned with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Raw status payload returned by the poll endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    /// Identifier of the job this payload describes.
    pub request_id: JobId,
    /// Status string, expected to be `SUBMITTED`, `COMPLETED` or `ERRORED`.
    pub inference_status: String,
    /// Annotation data, present once the job has completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_result: Option<serde_json::Value>,
    /// Failure description, present when the job has errored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JobPayload {
    /// Payload for a job that is still running.
    pub fn submitted(request_id: JobId) -> Self {
        Self {
            request_id,
            inference_status: JobStatus::Submitted.to_string(),
            inference_result: None,
            message: None,
        }
    }

    /// Payload for a job that completed with `result`.
    pub fn completed(request_id: JobId, result: serde_json::Value) -> Self {
        Self {
            request_id,
            inference_status: JobStatus::Completed.to_string(),
            inference_result: Some(result),
            message: None,
        }
    }

    /// Payload for a job that failed with `message`.
    pub fn errored(request_id: JobId, message: impl Into<String>) -> Self {
        Self {
            request_id,
            inference_status: JobStatus::Errored.to_string(),
            inference_result: None,
            message: Some(message.into()),
        }
    }
}

/// Validated job state, keyed by status.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// Still running; poll again later.
    Submitted,
    /// Finished; carries the annotation payload.
    Completed(serde_json::Value),
    /// Failed; carries the service message.
    Errored(String),
}

impl JobState {
    /// The status this state corresponds to.
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Submitted => JobStatus::Submitted,
            JobState::Completed(_) => JobStatus::Completed,
            JobState::Errored(_) => JobStatus::Errored,
        }
    }
}

impl TryFrom<JobPayload> for JobState {
    type Error = Error;

    fn try_from(payload: JobPayload) -> Result<Self> {
        let status = JobStatus::from_str(&payload.inference_status)
            .map_err(|_| Error::unknown_status(payload.inference_status.clone()))?;

        Ok(match status {
            JobStatus::Submitted => JobState::Submitted,
            JobStatus::Completed => {
                JobState::Completed(payload.inference_result.unwrap_or(serde_json::Value::Null))
            }
            JobStatus::Errored => JobState::Errored(
                payload
                    .message
                    .unwrap_or_else(|| DEFAULT_ERRORED_MESSAGE.to_owned()),
            ),
        })
    }
}

/// Normalized annotation of one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationResult {
    /// Identifier of the job that produced this result.
    pub job_id: JobId,
    /// Index of the annotated chunk.
    pub chunk_index: usize,
    /// Original chunk text.
    pub text: String,
    /// Structured annotation data, as returned by the service.
    pub annotation: serde_json::Value,
    /// Terminal status of the job.
    pub status: JobStatus,
}

/// Builds an [`Error::Http`] from a non-2xx status and its response body.
///
/// The message is taken from the structured `message` field when the body
/// has one, then from the raw body, then from the status reason phrase.
pub(crate) fn http_error(status: StatusCode, body: Option<&str>) -> Error {
    let structured = body
        .and_then(|body| serde_json::from_str::<ErrorBody>(body).ok())
        .and_then(|body| body.message);

    let message = match (structured, body) {
        (Some(message), _) => message,
        (None, Some(body)) if !body.trim().is_empty() => body.to_owned(),
        _ => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_owned(),
    };

    Error::http(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    fn payload(value: serde_json::Value) -> JobPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_submitted_state() {
        let state = JobState::try_from(payload(json!({
            "request_id": "req-1",
            "inference_status": "SUBMITTED"
        })))
        .unwrap();
        assert_eq!(state, JobState::Submitted);
    }

    #[test]
    fn test_completed_state() {
        let state = JobState::try_from(payload(json!({
            "request_id": "req-1",
            "inference_status": "COMPLETED",
            "inference_result": {"tokens": ["a", "b"]}
        })))
        .unwrap();
        assert_eq!(state, JobState::Completed(json!({"tokens": ["a", "b"]})));
    }

    #[test]
    fn test_completed_without_result() {
        let state = JobState::try_from(JobPayload {
            request_id: JobId::new("req-1"),
            inference_status: "COMPLETED".to_owned(),
            inference_result: None,
            message: None,
        })
        .unwrap();
        assert_eq!(state, JobState::Completed(serde_json::Value::Null));
    }

    #[test]
    fn test_errored_state() {
        let state = JobState::try_from(payload(json!({
            "request_id": "req-1",
            "inference_status": "ERRORED",
            "message": "text too long"
        })))
        .unwrap();
        assert_eq!(state, JobState::Errored("text too long".to_owned()));

        let state = JobState::try_from(payload(json!({
            "request_id": "req-1",
            "inference_status": "ERRORED"
        })))
        .unwrap();
        assert_eq!(state, JobState::Errored(DEFAULT_ERRORED_MESSAGE.to_owned()));
    }

    #[test]
    fn test_unknown_status() {
        let err = JobState::try_from(payload(json!({
            "request_id": "req-1",
            "inference_status": "PAUSED"
        })))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownStatus);
        assert!(err.to_string().contains("PAUSED"));
    }

    #[test]
    fn test_status_is_case_sensitive() {
        let err = JobState::try_from(JobPayload {
            request_id: JobId::new("req-1"),
            inference_status: "completed".to_owned(),
            inference_result: None,
            message: None,
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownStatus);
    }

    #[test]
    fn test_payload_constructors() {
        let id = JobId::new("req-9");
        assert_eq!(
            JobState::try_from(JobPayload::completed(id.clone(), json!(1))).unwrap(),
            JobState::Completed(json!(1))
        );
        assert_eq!(
            JobState::try_from(JobPayload::errored(id.clone(), "boom")).unwrap(),
            JobState::Errored("boom".to_owned())
        );
        assert_eq!(
            JobState::try_from(JobPayload::submitted(id)).unwrap(),
            JobState::Submitted
        );
    }

    #[test]
    fn test_http_error_structured_message() {
        let err = http_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(r#"{"message": "server error"}"#),
        );
        assert!(matches!(
            err,
            Error::Http { status: 500, ref message } if message == "server error"
        ));
    }

    #[test]
    fn test_http_error_raw_body() {
        let err = http_error(StatusCode::BAD_GATEWAY, Some("upstream down"));
        assert!(matches!(
            err,
            Error::Http { status: 502, ref message } if message == "upstream down"
        ));
    }

    #[test]
    fn test_http_error_empty_body() {
        let err = http_error(StatusCode::UNAUTHORIZED, Some(""));
        assert!(matches!(
            err,
            Error::Http { status: 401, ref message } if message == "Unauthorized"
        ));

        let err = http_error(StatusCode::NOT_FOUND, None);
        assert_eq!(err.status_code(), Some(404));
    }
}
