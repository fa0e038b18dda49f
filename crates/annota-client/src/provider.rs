//! The transport seam between job orchestration and the remote service.

use crate::Result;
use crate::job::JobId;
use crate::response::JobPayload;

/// Submits annotation jobs and reports their status.
///
/// [`AnnotaClient`](crate::AnnotaClient) implements this over HTTP. The
/// [`Annotator`](crate::Annotator) only talks to this trait, so tests and
/// alternative transports can stand in for the real service.
///
/// Implementations map every non-2xx response to [`Error::Http`] and must
/// not retry on their own.
///
/// [`Error::Http`]: crate::Error::Http
#[async_trait::async_trait]
pub trait JobProvider: Send + Sync {
    /// Creates a remote annotation job for `text` and returns its identifier.
    async fn submit(&self, text: &str) -> Result<JobId>;

    /// Performs one status check for `job_id`.
    async fn status(&self, job_id: &JobId) -> Result<JobPayload>;
}

#[async_trait::async_trait]
impl<P> JobProvider for std::sync::Arc<P>
where
    P: JobProvider + ?Sized,
{
    async fn submit(&self, text: &str) -> Result<JobId> {
        (**self).submit(text).await
    }

    async fn status(&self, job_id: &JobId) -> Result<JobPayload> {
        (**self).status(job_id).await
    }
}
