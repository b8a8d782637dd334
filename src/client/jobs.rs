//! Asynchronous Job Polling
//!
//! Mutations that the controller runs in the background answer with a job
//! link. The caller polls the job under exponential backoff until it reaches
//! `success` or `failure`, then reads the final job record for its outcome.

use super::{Query, RestClient};
use crate::config::BackoffSettings;
use crate::domain::JobState;
use crate::error::{Error, RestError, Result};
use crate::models::{Job, JobLinkResponse};
use backoff::future::retry_notify;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Uuid of the job referenced by an accepted mutation
pub fn job_uuid(link: &JobLinkResponse) -> Result<&str> {
    let job = link
        .job
        .as_ref()
        .ok_or_else(|| Error::UnexpectedResponse("missing job result".into()))?;
    job.uuid
        .as_deref()
        .ok_or_else(|| Error::UnexpectedResponse("missing job uuid for result".into()))
}

impl RestClient {
    /// Fetch a job by uuid
    pub async fn job_get(&self, uuid: &str) -> Result<Job> {
        self.get(&format!("cluster/jobs/{}", uuid), &Query::new().all_fields())
            .await
    }

    /// Whether the referenced job has reached a terminal state
    pub async fn is_job_finished(&self, link: &JobLinkResponse) -> Result<bool> {
        let uuid = job_uuid(link)?;
        let job = self.job_get(uuid).await?;
        let state = job
            .state
            .as_deref()
            .ok_or_else(|| Error::UnexpectedResponse("unexpected nil job state".into()))?;
        Ok(state.parse::<JobState>()?.is_terminal())
    }

    /// Poll the referenced job until it finishes, then report its outcome
    pub async fn poll_job_status(&self, link: &JobLinkResponse) -> Result<()> {
        let uuid = job_uuid(link)?;
        let settings = &self.config().polling.job;

        let client = self;
        let check = move || async move {
            match client.is_job_finished(link).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(backoff::Error::transient(Error::JobIncomplete {
                    uuid: uuid.to_string(),
                })),
                Err(e) if e.is_transient() => Err(backoff::Error::transient(e)),
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        };
        let notify = |err: Error, duration: Duration| {
            debug!(job = uuid, increment = ?duration, reason = %err, "Job not yet completed, waiting.");
        };

        if let Err(e) = retry_notify(settings.policy(), check, notify).await {
            if matches!(e, Error::JobIncomplete { .. }) {
                warn!(job = uuid, max_wait = ?settings.max_elapsed(), "Job not completed after max wait.");
            }
            return Err(e);
        }

        let job = self.job_get(uuid).await?;
        debug!(
            uuid = job.uuid.as_deref().unwrap_or_default(),
            description = job.description.as_deref().unwrap_or_default(),
            state = job.state.as_deref().unwrap_or_default(),
            message = job.message.as_deref().unwrap_or_default(),
            code = job.code.unwrap_or_default(),
            start_time = ?job.start_time,
            end_time = ?job.end_time,
            "Job completed."
        );

        let state = job.state.as_deref().unwrap_or_default().parse::<JobState>()?;
        match state {
            JobState::Success => {
                self.metrics.record_job(false);
                Ok(())
            }
            JobState::Failure => {
                self.metrics.record_job(true);
                Err(Error::JobFailed(RestError {
                    uuid: job.uuid.unwrap_or_default(),
                    description: job.description.unwrap_or_default(),
                    state: state.to_string(),
                    message: job.message.unwrap_or_default(),
                    code: job.code.unwrap_or_default(),
                    start_time: job.start_time,
                    end_time: job.end_time,
                }))
            }
            other => Err(Error::UnexpectedJobState(other.to_string())),
        }
    }

    /// Retry `check` under `settings` until it reports `true`.
    ///
    /// Not-found and transient errors count as "not yet"; other errors stop
    /// the wait immediately.
    pub async fn wait_until<F, Fut>(
        &self,
        what: &str,
        settings: &BackoffSettings,
        mut check: F,
    ) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let operation = move || {
            let pending = check();
            async move {
                match pending.await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(backoff::Error::transient(Error::NotFound(format!(
                        "{} does not exist",
                        what
                    )))),
                    Err(e) if e.is_retryable() => Err(backoff::Error::transient(e)),
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            }
        };
        let notify = |err: Error, duration: Duration| {
            debug!(target_object = what, increment = ?duration, reason = %err, "Waiting for object.");
        };

        retry_notify(settings.policy(), operation, notify)
            .await
            .map_err(|e| {
                warn!(target_object = what, max_wait = ?settings.max_elapsed(), error = %e, "Object did not appear in time.");
                e
            })
    }
}
