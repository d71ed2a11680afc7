//! HTTP plumbing shared by all intake endpoints.
//!
//! `IntakeApiClient` holds the reqwest client and the endpoint
//! configuration; the per-endpoint request/response code lives in the
//! sibling modules and the [`IntakeBackend`] impl ties them together.
//!
//! [`IntakeBackend`]: attest_core::backend::IntakeBackend

use attest_core::backend::{
    AdvanceRequest, EnhanceRequest, IntakeBackend, UploadRequest,
};
use attest_core::error::{AttestError, Result};
use attest_core::protocol::{AnswerEnhancement, ReportStatus, StepOutcome};
use attest_core::session::UploadedFile;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::BackendConfig;

/// REST implementation of the intake backend contract.
#[derive(Clone)]
pub struct IntakeApiClient {
    client: Client,
    config: BackendConfig,
}

impl IntakeApiClient {
    /// Creates a client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error when the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AttestError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Creates a client configured from secret.json / environment.
    pub fn try_from_env() -> Result<Self> {
        Self::new(BackendConfig::try_from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn apply_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        let builder = self.client.post(self.url(path)).json(body);
        let response = self
            .apply_auth(builder)
            .send()
            .await
            .map_err(map_transport_error)?;
        read_success(response).await
    }

    pub(crate) async fn get_json<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let builder = self.client.get(self.url(path));
        let response = self
            .apply_auth(builder)
            .send()
            .await
            .map_err(map_transport_error)?;
        read_success(response).await
    }
}

#[async_trait]
impl IntakeBackend for IntakeApiClient {
    async fn advance_step(&self, request: AdvanceRequest) -> Result<StepOutcome> {
        self.send_advance_step(request).await
    }

    async fn upload_attachment(&self, request: UploadRequest) -> Result<UploadedFile> {
        self.send_upload_attachment(request).await
    }

    async fn enhance_answer(&self, request: EnhanceRequest) -> Result<AnswerEnhancement> {
        self.send_enhance_answer(request).await
    }

    async fn report_status(&self, product_id: &str) -> Result<ReportStatus> {
        self.fetch_report_status(product_id).await
    }

    async fn submit_intake_form(&self, product_id: &str) -> Result<()> {
        self.send_submit_intake_form(product_id).await
    }
}

/// Checks the response status and deserializes the success body.
pub(crate) async fn read_success<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        return Err(map_http_error(status, body));
    }

    response.json().await.map_err(|e| AttestError::Serialization {
        format: "JSON".to_string(),
        message: format!("Failed to parse backend response: {e}"),
    })
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Maps a non-success HTTP response to an `Api` error, pulling the
/// message out of the standard `{"error": {"message": ...}}` envelope
/// when present.
pub(crate) fn map_http_error(status: StatusCode, body: String) -> AttestError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.clone());

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    AttestError::api(Some(status.as_u16()), message, retryable)
}

/// Maps a request that never produced a response to a `Transport` error.
pub(crate) fn map_transport_error(err: reqwest::Error) -> AttestError {
    if err.is_timeout() {
        AttestError::transport(format!("Request timed out: {err}"))
    } else if err.is_connect() {
        AttestError::transport(format!("Connection failed: {err}"))
    } else {
        AttestError::transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_prefers_envelope_message() {
        let err = map_http_error(
            StatusCode::BAD_REQUEST,
            r#"{"error": {"message": "answer is required"}}"#.to_string(),
        );
        match err {
            AttestError::Api {
                status,
                message,
                retryable,
            } => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "answer is required");
                assert!(!retryable);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn http_error_falls_back_to_raw_body() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream down".to_string());
        match err {
            AttestError::Api {
                message, retryable, ..
            } => {
                assert_eq!(message, "upstream down");
                assert!(retryable);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
