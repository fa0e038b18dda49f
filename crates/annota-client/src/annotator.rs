//! Concurrent chunk annotation.
//!
//! The [`Annotator`] segments input text, runs one submit-and-poll unit per
//! chunk, and gathers the per-chunk results back into input order.
//!
//! # Aggregation
//!
//! [`Annotator::annotate`] is all-or-nothing: the first failing unit fails
//! the whole call and the remaining units are dropped.
//! [`Annotator::annotate_settled`] instead waits for every unit and reports
//! one outcome per chunk.
//!
//! # Concurrency
//!
//! All units run concurrently on the calling task. There is no cap unless
//! one is set with [`Annotator::with_max_concurrent_jobs`], in which case a
//! semaphore bounds how many units are in flight at once.
//!
//! # Polling
//!
//! Each job is polled at a fixed interval until it completes, errors, or
//! exceeds its own [`PollPolicy::max_duration`]. Only the `SUBMITTED` state
//! is retried; every error is final for its unit.

use std::time::Duration;

use futures::future;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::client::AnnotaConfig;
use crate::job::Job;
use crate::provider::JobProvider;
use crate::response::{AnnotationResult, JobState};
use crate::segment::{Chunk, Segmenter};
use crate::{Error, Result, TRACING_TARGET_ANNOTATOR};

/// Default delay between two status checks of the same job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default time a job may take to reach a terminal status.
pub const DEFAULT_MAX_POLL_DURATION: Duration = Duration::from_secs(300);

/// Outcome of one chunk in [`Annotator::annotate_settled`].
pub type ChunkOutcome = Result<AnnotationResult>;

/// Fixed-interval polling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between two status checks.
    pub interval: Duration,
    /// Budget of a single job, counted from its submission.
    pub max_duration: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_duration: DEFAULT_MAX_POLL_DURATION,
        }
    }
}

/// Drives chunked annotation against a [`JobProvider`].
#[derive(Debug, Clone)]
pub struct Annotator<P> {
    provider: P,
    segmenter: Segmenter,
    policy: PollPolicy,
    max_concurrent_jobs: Option<usize>,
}

impl<P: JobProvider> Annotator<P> {
    /// Creates an annotator with default segmentation and polling.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            segmenter: Segmenter::default(),
            policy: PollPolicy::default(),
            max_concurrent_jobs: None,
        }
    }

    /// Creates an annotator using the orchestration settings of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the configured chunk length is zero.
    pub fn from_config(provider: P, config: &AnnotaConfig) -> Result<Self> {
        let annotator = Self::new(provider)
            .with_segmenter(Segmenter::new(config.max_chunk_length)?)
            .with_poll_policy(config.poll_policy());

        Ok(match config.max_concurrent_jobs {
            Some(limit) => annotator.with_max_concurrent_jobs(limit),
            None => annotator,
        })
    }

    /// Replaces the segmenter.
    pub fn with_segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Replaces the poll policy.
    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Caps the number of chunk units running at once. The limit is clamped
    /// to `1..=Semaphore::MAX_PERMITS`.
    pub fn with_max_concurrent_jobs(mut self, limit: usize) -> Self {
        self.max_concurrent_jobs = Some(limit.clamp(1, Semaphore::MAX_PERMITS));
        self
    }

    /// The underlying job provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The active poll policy.
    pub fn poll_policy(&self) -> PollPolicy {
        self.policy
    }

    /// Annotates `text`, returning one result per chunk in chunk order.
    ///
    /// # Errors
    ///
    /// Fails with the first error produced by any chunk, or with
    /// [`Error::InvalidInput`] when `text` is empty. No partial results are
    /// returned.
    pub async fn annotate(&self, text: &str) -> Result<Vec<AnnotationResult>> {
        self.annotate_all(text, None).await
    }

    /// Like [`annotate`](Self::annotate), but stops every unit with
    /// [`Error::Cancelled`] once `token` is cancelled.
    pub async fn annotate_with_cancellation(
        &self,
        text: &str,
        token: &CancellationToken,
    ) -> Result<Vec<AnnotationResult>> {
        self.annotate_all(text, Some(token)).await
    }

    /// Annotates `text` and waits for every chunk, returning one outcome per
    /// chunk in chunk order.
    ///
    /// # Errors
    ///
    /// Only segmentation errors fail the call; per-chunk failures are
    /// reported in the returned outcomes.
    pub async fn annotate_settled(&self, text: &str) -> Result<Vec<ChunkOutcome>> {
        let chunks = self.segmenter.segment(text)?;
        let chunk_count = chunks.len();
        let limiter = self.limiter();

        tracing::info!(
            target: TRACING_TARGET_ANNOTATOR,
            chunks = chunk_count,
            max_concurrent_jobs = ?self.max_concurrent_jobs,
            "Annotating text, collecting every outcome"
        );

        let units = chunks
            .into_iter()
            .map(|chunk| self.run_unit(chunk, limiter.as_ref(), None));
        let outcomes = future::join_all(units).await;

        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        tracing::info!(
            target: TRACING_TARGET_ANNOTATOR,
            chunks = chunk_count,
            failed,
            "Annotation settled"
        );

        Ok(outcomes)
    }

    /// Submits one chunk and returns the freshly created job.
    pub async fn submit(&self, chunk: Chunk) -> Result<Job> {
        let job_id = self.provider.submit(&chunk.text).await?;

        tracing::debug!(
            target: TRACING_TARGET_ANNOTATOR,
            job_id = %job_id,
            chunk_index = chunk.index,
            "Chunk submitted"
        );

        Ok(Job::submitted(job_id, chunk))
    }

    /// Performs one status check of `job` and applies the observed state.
    ///
    /// Returns `Ok(None)` while the job is still running.
    ///
    /// # Errors
    ///
    /// - [`Error::Annotation`] if the job reported `ERRORED`.
    /// - [`Error::UnknownStatus`] for an unrecognized status value.
    /// - [`Error::InvalidResponse`] if the payload belongs to another job or
    ///   moves the job backwards.
    /// - Any error of the status call itself.
    pub async fn poll(&self, job: &mut Job) -> Result<Option<AnnotationResult>> {
        let payload = self.provider.status(job.id()).await?;

        if payload.request_id != *job.id() {
            return Err(Error::invalid_response(format!(
                "status for job {} answered with job {}",
                job.id(),
                payload.request_id
            )));
        }

        let state = JobState::try_from(payload)?;
        job.observe(state)
    }

    /// Polls `job` at the policy interval until it reaches a terminal status
    /// or its budget runs out.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when the budget is exhausted, otherwise the
    /// first error of [`poll`](Self::poll).
    pub async fn wait(&self, job: &mut Job) -> Result<AnnotationResult> {
        let budget = self.policy.max_duration;
        let outcome = tokio::time::timeout(budget, self.poll_until_terminal(job)).await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    target: TRACING_TARGET_ANNOTATOR,
                    job_id = %job.id(),
                    chunk_index = job.chunk().index,
                    submitted_at = %job.submitted_at(),
                    budget = ?budget,
                    "Job exceeded its poll budget"
                );
                Err(Error::timeout(budget))
            }
        }
    }

    async fn poll_until_terminal(&self, job: &mut Job) -> Result<AnnotationResult> {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            if let Some(result) = self.poll(job).await? {
                tracing::debug!(
                    target: TRACING_TARGET_ANNOTATOR,
                    job_id = %job.id(),
                    chunk_index = job.chunk().index,
                    attempts,
                    "Job completed"
                );
                return Ok(result);
            }

            tracing::trace!(
                target: TRACING_TARGET_ANNOTATOR,
                job_id = %job.id(),
                attempts,
                "Job still running"
            );

            tokio::time::sleep(self.policy.interval).await;
        }
    }

    async fn annotate_all(
        &self,
        text: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<AnnotationResult>> {
        let chunks = self.segmenter.segment(text)?;
        let chunk_count = chunks.len();
        let limiter = self.limiter();

        tracing::info!(
            target: TRACING_TARGET_ANNOTATOR,
            chunks = chunk_count,
            max_concurrent_jobs = ?self.max_concurrent_jobs,
            "Annotating text"
        );

        let units = chunks
            .into_iter()
            .map(|chunk| self.run_unit(chunk, limiter.as_ref(), cancel));

        // Output order follows input order, whatever the completion order.
        let results = future::try_join_all(units).await.inspect_err(|error| {
            tracing::error!(
                target: TRACING_TARGET_ANNOTATOR,
                kind = %error.kind(),
                error = %error,
                "Annotation failed"
            );
        })?;

        tracing::info!(
            target: TRACING_TARGET_ANNOTATOR,
            chunks = chunk_count,
            "Annotation completed"
        );

        Ok(results)
    }

    fn limiter(&self) -> Option<Semaphore> {
        self.max_concurrent_jobs.map(Semaphore::new)
    }

    async fn run_unit(
        &self,
        chunk: Chunk,
        limiter: Option<&Semaphore>,
        cancel: Option<&CancellationToken>,
    ) -> Result<AnnotationResult> {
        let chunk_index = chunk.index;

        let unit = async {
            let _permit = match limiter {
                Some(semaphore) => Some(semaphore.acquire().await.map_err(|_| Error::Cancelled)?),
                None => None,
            };

            let mut job = self.submit(chunk).await?;
            self.wait(&mut job).await
        };

        let Some(token) = cancel else {
            return unit.await;
        };

        tokio::select! {
            biased;

            () = token.cancelled() => {
                tracing::debug!(
                    target: TRACING_TARGET_ANNOTATOR,
                    chunk_index,
                    "Chunk cancelled"
                );
                Err(Error::Cancelled)
            }

            result = unit => result,
        }
    }
}
