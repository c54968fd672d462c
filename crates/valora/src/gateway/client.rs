use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::GatewayError;
use crate::config::GatewayConfig;
use crate::valuation::{JobStatus, UploadReceipt, ValuationOutcome, ValuationRequest};

const USER_AGENT: &str = "valora-gateway/0.1.0";

/// Image forwarded to the orchestrator's upload route.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// HTTP client for the valuation orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    http: Client,
    base_url: String,
}

impl OrchestratorClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.orchestrator_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn submit(&self, request: &ValuationRequest) -> Result<ValuationOutcome, GatewayError> {
        let response = self
            .http
            .post(format!("{}/valuations", self.base_url))
            .json(request)
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!("orchestrator reported usage limit");
            return Err(GatewayError::UsageLimit);
        }
        decode(response.error_for_status()?).await
    }

    pub async fn job(&self, job_id: &str) -> Result<JobStatus, GatewayError> {
        let response = self
            .http
            .get(format!("{}/jobs/{job_id}", self.base_url))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::JobNotFound);
        }
        decode(response.error_for_status()?).await
    }

    pub async fn upload(
        &self,
        valuation_id: &str,
        image: ImageUpload,
    ) -> Result<UploadReceipt, GatewayError> {
        let mut part = Part::bytes(image.bytes)
            .file_name(image.file_name.unwrap_or_else(|| "upload".to_string()));
        if let Some(content_type) = &image.content_type {
            part = part.mime_str(content_type).map_err(GatewayError::UploadFailed)?;
        }

        let response = self
            .http
            .post(format!("{}/valuations/{valuation_id}/images", self.base_url))
            .multipart(Form::new().part("image", part))
            .send()
            .await
            .map_err(GatewayError::UploadFailed)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| body.get("detail").and_then(Value::as_str).map(str::to_owned))
                .unwrap_or_else(|| "Upload failed".to_string());
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }
        response.json().await.map_err(GatewayError::UploadFailed)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    debug!(status = %response.status(), url = %response.url(), "orchestrator responded");
    Ok(response.json().await?)
}
