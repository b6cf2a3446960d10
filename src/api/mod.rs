//! FusionBrain text-to-image service integration
//!
//! Stateless HTTP client for listing models, submitting a generation job,
//! and polling its status, plus a scripted mock for tests.

pub mod client;
pub mod mock;

pub use client::FusionBrainClient;
pub use mock::MockGenerationClient;

use crate::models::{GenerationRequest, ModelInfo};
use crate::Result;
use async_trait::async_trait;

/// One remote poll observation. `Done` with an empty image list never
/// occurs: the client maps it to `Censored` before it reaches the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Pending,
    Done(Vec<String>),
    Failed(String),
    Censored,
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
    async fn submit(&self, request: &GenerationRequest) -> Result<String>;
    async fn poll(&self, job_id: &str) -> Result<RemoteStatus>;
}
