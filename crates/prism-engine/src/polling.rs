//! Bounded polling for scan and analysis jobs.
//!
//! Only the status check is repeated: the action that started the job is
//! never retried. Waiting gives up with `CoreError::Timeout` after
//! `max_attempts` checks.

use std::time::Duration;

use prism_config::PollingConfig;
use prism_core::entities::Job;
use prism_core::enums::JobStatus;
use prism_core::errors::CoreError;

use crate::backend::Backend;

/// Polling cadence for long-running jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Fixed delay before each status check.
    pub interval: Duration,
    /// Status checks before giving up.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollConfig {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: config.interval(),
            max_attempts: config.max_attempts,
        }
    }
}

impl PollConfig {
    /// No delay between checks, for tests and in-process backends.
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            interval: Duration::ZERO,
            max_attempts,
        }
    }
}

fn settle(job: Job) -> Result<Job, CoreError> {
    match job.status {
        JobStatus::Failed => Err(CoreError::Transport(format!(
            "{} job {} failed: {}",
            job.kind,
            job.id,
            job.error.as_deref().unwrap_or("no error reported")
        ))),
        _ => Ok(job),
    }
}

/// Wait until `job` finishes.
///
/// # Errors
///
/// Returns `CoreError::Timeout` when the job is still running after
/// `max_attempts` checks, `CoreError::Transport` when it finished as failed,
/// and any error from the status calls.
pub async fn wait_for_job<B: Backend + ?Sized>(
    backend: &B,
    job: Job,
    config: &PollConfig,
) -> Result<Job, CoreError> {
    if job.status.is_finished() {
        return settle(job);
    }
    for attempt in 1..=config.max_attempts {
        tokio::time::sleep(config.interval).await;
        let current = backend.job_status(job.id).await?;
        tracing::debug!(job_id = job.id, attempt, status = %current.status, "polled job");
        if current.status.is_finished() {
            return settle(current);
        }
    }
    Err(CoreError::Timeout {
        job: format!("{} job {}", job.kind, job.id),
        attempts: config.max_attempts,
    })
}
