//! Generation job state machine
//!
//! Tracks one submitted generation request from submission to a terminal
//! outcome. "Still in progress" is a state, not an error: the polling loop
//! branches on [`RemoteStatus`] data so expected outcomes (censorship,
//! timeout) are never confused with failures.

use crate::api::{GenerationService, RemoteStatus};
use crate::{Error, Result};
use base64::Engine as _;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Submitted,
    Polling,
    Done,
    Failed,
    Censored,
    TimedOut,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Done | JobStatus::Failed | JobStatus::Censored | JobStatus::TimedOut
        )
    }
}

/// One in-flight generation. Created per user action and discarded once a
/// terminal state is reached; never reused across requests.
#[derive(Debug)]
pub struct GenerationJob {
    job_id: String,
    status: JobStatus,
    attempt_count: u32,
    max_attempts: u32,
    poll_interval: Duration,
    result_image: Option<Vec<u8>>,
    failure_reason: Option<String>,
}

impl GenerationJob {
    pub fn new(job_id: String) -> Self {
        Self {
            job_id,
            status: JobStatus::Submitted,
            attempt_count: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            result_image: None,
            failure_reason: None,
        }
    }

    pub fn with_limits(mut self, max_attempts: u32, poll_interval: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.poll_interval = poll_interval;
        self
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Decoded image bytes; present exactly when the job finished `Done`.
    pub fn result_image(&self) -> Option<&[u8]> {
        self.result_image.as_deref()
    }

    pub fn take_result(&mut self) -> Option<Vec<u8>> {
        self.result_image.take()
    }

    /// One poll attempt. A no-op once the job is terminal.
    pub async fn poll_once(&mut self, service: &dyn GenerationService) -> Result<JobStatus> {
        if self.status.is_terminal() {
            return Ok(self.status);
        }

        self.attempt_count += 1;
        let remote = service.poll(&self.job_id).await?;
        tracing::debug!(
            "Job {} poll {}/{}: {:?}",
            self.job_id,
            self.attempt_count,
            self.max_attempts,
            remote
        );

        match remote {
            RemoteStatus::Pending => {
                if self.attempt_count >= self.max_attempts {
                    tracing::warn!(
                        "Job {} still pending after {} attempts, giving up",
                        self.job_id,
                        self.attempt_count
                    );
                    self.status = JobStatus::TimedOut;
                } else {
                    self.status = JobStatus::Polling;
                }
            }
            RemoteStatus::Done(images) => {
                // Only one image is ever requested; extras are discarded.
                let first = images
                    .first()
                    .ok_or_else(|| Error::Service("DONE response with no images".to_string()))?;
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(first)
                    .map_err(|e| {
                        self.status = JobStatus::Failed;
                        self.failure_reason = Some(format!("invalid base64 image: {}", e));
                        Error::Service(format!("Failed to decode base64 image: {}", e))
                    })?;
                self.result_image = Some(bytes);
                self.status = JobStatus::Done;
                tracing::info!(
                    "Job {} done after {} poll attempts",
                    self.job_id,
                    self.attempt_count
                );
            }
            RemoteStatus::Censored => {
                tracing::info!("Job {} rejected by content moderation", self.job_id);
                self.status = JobStatus::Censored;
            }
            RemoteStatus::Failed(reason) => {
                tracing::warn!("Job {} failed: {}", self.job_id, reason);
                self.failure_reason = Some(reason);
                self.status = JobStatus::Failed;
            }
        }

        Ok(self.status)
    }

    /// Drive the job to a terminal state, sleeping one poll interval between
    /// pending attempts. This is the only intentional sleep in the core.
    pub async fn run_to_completion(&mut self, service: &dyn GenerationService) -> Result<JobStatus> {
        loop {
            let status = self.poll_once(service).await?;
            if status.is_terminal() {
                return Ok(status);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
