//! Pipeline orchestration for the presentation layer
//!
//! Wires the prompt composer, generation client, job state machine,
//! background remover, and session store into the narrow boundary the bot
//! front-end consumes. All user-facing text, menus, and command parsing
//! stay on the other side of this boundary.

use crate::api::{FusionBrainClient, GenerationService};
use crate::image::{BackgroundModel, BackgroundRemover};
use crate::job::{GenerationJob, JobStatus, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use crate::models::{Config, GenerationRequest, ImageSize, Style};
use crate::prompt;
use crate::session::{SessionStore, UserSession};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Model id used when the model listing is unavailable (Kandinsky 3.1).
pub const FALLBACK_MODEL_ID: i64 = 4;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub fallback_model_id: i64,
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fallback_model_id: FALLBACK_MODEL_ID,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// A submitted generation being driven to completion, together with what
/// the presentation layer needs to report about it.
#[derive(Debug)]
pub struct PendingGeneration {
    pub job: GenerationJob,
    pub source_prompt: String,
    /// The raw text exceeded the prompt cap and was cut down; the caller
    /// should warn the user.
    pub truncated: bool,
}

/// Outcome of handing free text to the pipeline.
#[derive(Debug)]
pub enum Submission {
    Started(PendingGeneration),
    /// The user was not in the awaiting-prompt state; nothing happened.
    Ignored,
}

pub struct Pipeline {
    service: Box<dyn GenerationService>,
    remover: BackgroundRemover,
    sessions: SessionStore,
    config: PipelineConfig,
}

impl Pipeline {
    /// Build a pipeline from concrete service dependencies. This is the
    /// constructor tests and harnesses use to inject mocks.
    pub fn with_services(
        service: Box<dyn GenerationService>,
        model: Arc<dyn BackgroundModel>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            service,
            remover: BackgroundRemover::new(model),
            sessions: SessionStore::new(),
            config,
        }
    }

    /// Construct a pipeline against the live FusionBrain service using
    /// environment configuration.
    pub fn from_env(model: Arc<dyn BackgroundModel>) -> Result<Self> {
        let config = Config::from_env()?;
        let client = FusionBrainClient::new(config.api_key, config.secret_key)
            .with_base_url(config.base_url);
        Ok(Self::with_services(
            Box::new(client),
            model,
            PipelineConfig::default(),
        ))
    }

    pub fn session(&self, user_id: u64) -> UserSession {
        self.sessions.get_or_create(user_id)
    }

    /// Mark the user as composing a prompt; the next free text they send
    /// starts a generation.
    pub fn begin_prompt(&self, user_id: u64) {
        self.sessions.set_awaiting_prompt(user_id, true);
    }

    pub fn set_size(&self, user_id: u64, size: ImageSize) {
        self.sessions.set_size(user_id, size);
    }

    pub fn set_style(&self, user_id: u64, style: Style) {
        self.sessions.set_style(user_id, style);
    }

    async fn resolve_model_id(&self) -> i64 {
        match self.service.list_models().await {
            Ok(models) => match models.first() {
                Some(model) => {
                    info!("Using model {} (id {})", model.name, model.id);
                    model.id
                }
                None => {
                    warn!(
                        "Model listing is empty, falling back to model id {}",
                        self.config.fallback_model_id
                    );
                    self.config.fallback_model_id
                }
            },
            Err(e) => {
                warn!(
                    "Failed to list models ({}), falling back to model id {}",
                    e, self.config.fallback_model_id
                );
                self.config.fallback_model_id
            }
        }
    }

    async fn start_generation(
        &self,
        user_id: u64,
        raw_text: &str,
        style: Style,
        size: ImageSize,
    ) -> Result<PendingGeneration> {
        let composed = prompt::compose(raw_text, style);
        let model_id = self.resolve_model_id().await;

        let request = GenerationRequest {
            prompt: composed.text,
            model_id,
            size,
            style,
        };

        let job_id = self.service.submit(&request).await?;
        info!("Generation started for user {}: job {}", user_id, job_id);

        Ok(PendingGeneration {
            job: GenerationJob::new(job_id)
                .with_limits(self.config.max_attempts, self.config.poll_interval),
            source_prompt: raw_text.to_string(),
            truncated: composed.truncated,
        })
    }

    /// Handle free text from a user. Submits a generation when the session
    /// is awaiting a prompt, otherwise reports an ignored no-op and leaves
    /// the presentation layer to decide what, if anything, to tell the user.
    pub async fn submit_generation(&self, user_id: u64, raw_text: &str) -> Result<Submission> {
        let session = self.sessions.get_or_create(user_id);
        if !session.awaiting_prompt {
            return Ok(Submission::Ignored);
        }

        let pending = self
            .start_generation(user_id, raw_text, session.settings.style, session.settings.size)
            .await?;
        self.sessions.set_awaiting_prompt(user_id, false);
        Ok(Submission::Started(pending))
    }

    /// Start a fresh job from the stored prompt of the user's last artifact.
    pub async fn regenerate(&self, user_id: u64) -> Result<PendingGeneration> {
        let artifact = self
            .sessions
            .last_artifact(user_id)
            .ok_or_else(|| Error::Validation("no previous prompt to regenerate".to_string()))?;

        let session = self.sessions.get_or_create(user_id);
        self.start_generation(
            user_id,
            &artifact.source_prompt,
            session.settings.style,
            session.settings.size,
        )
        .await
    }

    /// One poll step; on completion the resulting image is recorded as the
    /// user's new artifact.
    pub async fn poll_once(
        &self,
        user_id: u64,
        pending: &mut PendingGeneration,
    ) -> Result<JobStatus> {
        let status = pending.job.poll_once(self.service.as_ref()).await?;
        if status == JobStatus::Done {
            if let Some(image) = pending.job.take_result() {
                self.sessions
                    .record_artifact(user_id, image, &pending.source_prompt);
            }
        }
        Ok(status)
    }

    /// Drive a pending generation to its terminal state, recording the
    /// artifact on success.
    pub async fn run_job(&self, user_id: u64, pending: &mut PendingGeneration) -> Result<JobStatus> {
        loop {
            let status = self.poll_once(user_id, pending).await?;
            if status.is_terminal() {
                return Ok(status);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Strip the background from the user's last artifact. The stripped
    /// image becomes the new artifact; on failure the previous artifact is
    /// preserved so the user can retry.
    pub async fn remove_background(&self, user_id: u64) -> Result<Vec<u8>> {
        let artifact = self
            .sessions
            .last_artifact(user_id)
            .ok_or_else(|| Error::Validation("no image to process".to_string()))?;

        let result = self.remover.remove(&artifact.image_bytes).await?;
        self.sessions
            .record_artifact(user_id, result.clone(), &artifact.source_prompt);
        Ok(result)
    }
}
