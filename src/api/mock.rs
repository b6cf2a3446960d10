use super::{GenerationService, RemoteStatus};
use crate::models::{GenerationRequest, ModelInfo};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Scripted stand-in for the FusionBrain service. Poll responses are
/// consumed in order; the last one repeats once the script runs out.
#[derive(Clone)]
pub struct MockGenerationClient {
    models: Arc<Mutex<Vec<ModelInfo>>>,
    poll_responses: Arc<Mutex<Vec<RemoteStatus>>>,
    submitted: Arc<Mutex<Vec<GenerationRequest>>>,
    poll_count: Arc<Mutex<usize>>,
    fail_list_models: Arc<Mutex<bool>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            models: Arc::new(Mutex::new(Vec::new())),
            poll_responses: Arc::new(Mutex::new(Vec::new())),
            submitted: Arc::new(Mutex::new(Vec::new())),
            poll_count: Arc::new(Mutex::new(0)),
            fail_list_models: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_model(self, id: i64, name: &str) -> Self {
        self.models.lock().unwrap().push(ModelInfo {
            id,
            name: name.to_string(),
            version: 3.1,
        });
        self
    }

    pub fn with_poll_response(self, response: RemoteStatus) -> Self {
        self.poll_responses.lock().unwrap().push(response);
        self
    }

    pub fn with_list_models_failure(self) -> Self {
        *self.fail_list_models.lock().unwrap() = true;
        self
    }

    pub fn get_poll_count(&self) -> usize {
        *self.poll_count.lock().unwrap()
    }

    pub fn submitted_requests(&self) -> Vec<GenerationRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        if *self.fail_list_models.lock().unwrap() {
            return Err(Error::Service("mock model listing failure".to_string()));
        }
        Ok(self.models.lock().unwrap().clone())
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<String> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(request.clone());
        Ok(format!("mock-job-{}", submitted.len()))
    }

    async fn poll(&self, _job_id: &str) -> Result<RemoteStatus> {
        let mut count = self.poll_count.lock().unwrap();
        *count += 1;

        let responses = self.poll_responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(RemoteStatus::Pending);
        }
        let index = (*count - 1).min(responses.len() - 1);
        Ok(responses[index].clone())
    }
}
