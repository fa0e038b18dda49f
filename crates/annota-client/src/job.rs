//! Remote annotation jobs and their status lifecycle.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::response::{AnnotationResult, JobState};
use crate::segment::Chunk;
use crate::{Error, Result};

/// Opaque job identifier assigned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wraps a service-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a remote job, as reported in `inference_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Accepted and still running.
    Submitted,
    /// Finished with an annotation result.
    Completed,
    /// Finished with an error.
    Errored,
}

impl JobStatus {
    /// Whether no further polling is needed.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored)
    }

    /// Whether a job currently in `self` may be observed in `next`.
    ///
    /// Statuses only move forward. Observing the same terminal status twice
    /// is allowed.
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Submitted => true,
            Self::Completed => matches!(next, Self::Completed),
            Self::Errored => matches!(next, Self::Errored),
        }
    }
}

/// A submitted chunk and everything observed about its remote job so far.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    chunk: Chunk,
    submitted_at: Timestamp,
    status: JobStatus,
    result: Option<serde_json::Value>,
}

impl Job {
    /// Records a freshly submitted job for `chunk`.
    pub fn submitted(id: JobId, chunk: Chunk) -> Self {
        Self {
            id,
            chunk,
            submitted_at: Timestamp::now(),
            status: JobStatus::Submitted,
            result: None,
        }
    }

    /// Service-issued identifier.
    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// The chunk this job annotates.
    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    /// When the job was submitted.
    pub fn submitted_at(&self) -> Timestamp {
        self.submitted_at
    }

    /// Last observed status.
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Annotation payload, present once the job has completed.
    pub fn result(&self) -> Option<&serde_json::Value> {
        self.result.as_ref()
    }

    /// Applies one observed state to the job.
    ///
    /// Returns `Ok(None)` while the job is still running and the normalized
    /// result once it has completed.
    ///
    /// # Errors
    ///
    /// - [`Error::Annotation`] if the job reported `ERRORED`.
    /// - [`Error::InvalidResponse`] if the observed status would move the job
    ///   backwards or from one terminal status to the other.
    pub fn observe(&mut self, state: JobState) -> Result<Option<AnnotationResult>> {
        let next = state.status();
        if !self.status.can_transition_to(next) {
            return Err(Error::invalid_response(format!(
                "job {} moved from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;

        match state {
            JobState::Submitted => Ok(None),
            JobState::Completed(annotation) => {
                self.result = Some(annotation.clone());
                Ok(Some(AnnotationResult {
                    job_id: self.id.clone(),
                    chunk_index: self.chunk.index,
                    text: self.chunk.text.clone(),
                    annotation,
                    status: JobStatus::Completed,
                }))
            }
            JobState::Errored(message) => Err(Error::annotation(self.id.clone(), message)),
        }
    }
}
