use super::{GenerationService, RemoteStatus};
use crate::models::{
    GenerateParams, GenerationRequest, ModelInfo, StatusResponse, SubmitParams, SubmitResponse,
};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api-key.fusionbrain.ai";

pub struct FusionBrainClient {
    client: Client,
    api_key: String,
    secret_key: String,
    base_url: String,
}

impl FusionBrainClient {
    pub fn new(api_key: String, secret_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            secret_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("X-Key", format!("Key {}", self.api_key))
            .header("X-Secret", format!("Secret {}", self.secret_key))
    }

    /// Map the response status to the error taxonomy, or hand back the
    /// response for body parsing. 451 is the service's moderation signal.
    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!("FusionBrain API error (status {}): {}", status, body);
        match status {
            StatusCode::UNAUTHORIZED => Err(Error::Auth(body)),
            StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimit(body)),
            StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS => Err(Error::Censorship),
            _ => Err(Error::Service(format!("status {}: {}", status, body))),
        }
    }

    async fn parse_body<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse FusionBrain response: {}\nBody: {}", e, body);
            Error::Service(format!("malformed response: {}", e))
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.auth(self.client.get(&url)).send().await.map_err(|e| {
            tracing::error!("Failed to send request to FusionBrain: {}", e);
            e
        })?;
        let response = self.check_status(response).await?;
        self.parse_body(response).await
    }
}

#[async_trait]
impl GenerationService for FusionBrainClient {
    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        tracing::debug!("Listing FusionBrain models");
        self.get_json("/key/api/v1/models").await
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<String> {
        let (width, height) = request.size.dimensions();
        let params = SubmitParams {
            kind: "GENERATE".to_string(),
            num_images: 1,
            width,
            height,
            generate_params: GenerateParams {
                query: request.prompt.clone(),
            },
        };

        // The run endpoint takes a multipart form: a plain model_id field
        // and the parameter block as a JSON part.
        let form = Form::new()
            .part("model_id", Part::text(request.model_id.to_string()))
            .part(
                "params",
                Part::text(serde_json::to_string(&params)?).mime_str("application/json")?,
            );

        let url = format!("{}/key/api/v1/text2image/run", self.base_url);
        tracing::debug!("Submitting generation job to {}", url);
        let response = self
            .auth(self.client.post(&url).multipart(form))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to submit generation job: {}", e);
                e
            })?;
        let response = self.check_status(response).await?;
        let submit: SubmitResponse = self.parse_body(response).await?;

        submit
            .uuid
            .ok_or_else(|| Error::Service("submit response carried no job id".to_string()))
    }

    async fn poll(&self, job_id: &str) -> Result<RemoteStatus> {
        let status: StatusResponse = self
            .get_json(&format!("/key/api/v1/text2image/status/{}", job_id))
            .await?;

        match status.status.as_str() {
            "INITIAL" | "PROCESSING" => Ok(RemoteStatus::Pending),
            "DONE" => {
                let images = status.images.unwrap_or_default();
                if images.is_empty() {
                    // A nominally successful response with nothing in it is
                    // the service's other moderation signal, not a success.
                    tracing::warn!("Job {} finished with no images, treating as censored", job_id);
                    Ok(RemoteStatus::Censored)
                } else {
                    Ok(RemoteStatus::Done(images))
                }
            }
            "FAILED" => Ok(RemoteStatus::Failed(
                status.error.unwrap_or_else(|| "generation failed".to_string()),
            )),
            other => Err(Error::Service(format!("unknown job status: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageSize, Style};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_request() -> GenerationRequest {
        GenerationRequest {
            prompt: "a red fox".to_string(),
            model_id: 4,
            size: ImageSize::Square,
            style: Style::Default,
        }
    }

    async fn test_client(server: &MockServer) -> FusionBrainClient {
        FusionBrainClient::new("key".to_string(), "secret".to_string())
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_list_models() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/key/api/v1/models"))
            .and(header("X-Key", "Key key"))
            .and(header("X-Secret", "Secret secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": 4, "name": "Kandinsky", "version": 3.1, "type": "TEXT2IMAGE" }
            ])))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let models = client.list_models().await.unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, 4);
        assert_eq!(models[0].name, "Kandinsky");
    }

    #[tokio::test]
    async fn test_submit_returns_uuid() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/key/api/v1/text2image/run"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "uuid": "job-123",
                "status": "INITIAL"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let uuid = client.submit(&test_request()).await.unwrap();
        assert_eq!(uuid, "job-123");
    }

    #[tokio::test]
    async fn test_submit_without_uuid_is_service_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/key/api/v1/text2image/run"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let err = client.submit(&test_request()).await.unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/key/api/v1/models"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let err = client.list_models().await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_rate_limit_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/key/api/v1/models"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let err = client.list_models().await.unwrap_err();
        assert!(matches!(err, Error::RateLimit(_)));
    }

    #[tokio::test]
    async fn test_http_451_maps_to_censorship() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/key/api/v1/text2image/run"))
            .respond_with(ResponseTemplate::new(451))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let err = client.submit(&test_request()).await.unwrap_err();
        assert!(matches!(err, Error::Censorship));
    }

    #[tokio::test]
    async fn test_poll_pending_states() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/key/api/v1/text2image/status/job-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "status": "PROCESSING" })),
            )
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        assert_eq!(client.poll("job-1").await.unwrap(), RemoteStatus::Pending);
    }

    #[tokio::test]
    async fn test_poll_done_with_images() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/key/api/v1/text2image/status/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "DONE",
                "images": ["aGVsbG8="]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        assert_eq!(
            client.poll("job-1").await.unwrap(),
            RemoteStatus::Done(vec!["aGVsbG8=".to_string()])
        );
    }

    #[tokio::test]
    async fn test_poll_done_without_images_is_censored() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/key/api/v1/text2image/status/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "DONE",
                "images": []
            })))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        assert_eq!(client.poll("job-1").await.unwrap(), RemoteStatus::Censored);
    }

    #[tokio::test]
    async fn test_poll_failed_carries_reason() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/key/api/v1/text2image/status/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "FAILED",
                "error": "model exploded"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        assert_eq!(
            client.poll("job-1").await.unwrap(),
            RemoteStatus::Failed("model exploded".to_string())
        );
    }
}
