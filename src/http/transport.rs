use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::request::{ApiRequest, ApiResponse, RequestBody};
use crate::config::ApiConfig;
use crate::error::ClientError;

/// Puts a fully prepared request on the wire and reads the response.
///
/// Implementations return `Ok` for every response that arrived, whatever its
/// status; status handling belongs to the client.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, url: &str, request: &ApiRequest) -> Result<ApiResponse, ClientError>;
}

/// The production transport, backed by a shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_millis(config.timeout_in_ms))
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(ReqwestTransport { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, url: &str, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        debug!(
            request_id = %request.id,
            status = status.as_u16(),
            "Received {} bytes from {}",
            body.len(),
            url
        );

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
