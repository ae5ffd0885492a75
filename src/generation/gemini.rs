//! Google Gemini client for the `generateContent` endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{GenerationRequest, TextGenerator};
use crate::config::ApiKey;
use crate::error::{AuditError, GenerationError, Result, UnavailableError};

/// Base URL for the Gemini API
pub const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    candidate_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: GeminiError,
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    api_key: ApiKey,
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a client against the public Gemini endpoint
    pub fn new(api_key: ApiKey, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, API_BASE_URL, timeout)
    }

    /// Create a client against a custom endpoint (proxies, tests)
    pub fn with_base_url(
        api_key: ApiKey,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuditError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    fn build_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn build_body(request: &GenerationRequest) -> GeminiRequest<'_> {
        let generation_config =
            if request.temperature.is_some() || request.max_output_tokens.is_some() {
                Some(GenerationConfig {
                    temperature: request.temperature,
                    max_output_tokens: request.max_output_tokens,
                    candidate_count: 1,
                })
            } else {
                None
            };

        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config,
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> AuditError {
        if err.is_timeout() {
            GenerationError::Timeout {
                seconds: self.timeout.as_secs(),
            }
            .into()
        } else {
            GenerationError::Network {
                reason: err.to_string(),
            }
            .into()
        }
    }

    /// Map a non-success status to the transient/non-transient split
    fn map_status(status: StatusCode, body: &str, model: &str) -> AuditError {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        let code = status.as_u16();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                UnavailableError::Unauthorized { status: code, message }.into()
            }
            StatusCode::TOO_MANY_REQUESTS => UnavailableError::QuotaExhausted { message }.into(),
            StatusCode::NOT_FOUND => UnavailableError::ModelNotFound {
                model: model.to_string(),
            }
            .into(),
            // Gemini reports bad keys as INVALID_ARGUMENT
            StatusCode::BAD_REQUEST if message.contains("API key") => {
                UnavailableError::Unauthorized { status: code, message }.into()
            }
            StatusCode::REQUEST_TIMEOUT => GenerationError::Server { status: code, message }.into(),
            s if s.is_server_error() => GenerationError::Server { status: code, message }.into(),
            _ => UnavailableError::Rejected { status: code, message }.into(),
        }
    }

    fn extract_text(body: &str) -> Result<String> {
        let response: GeminiResponse =
            serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse {
                reason: e.to_string(),
            })?;

        if let Some(err) = response.error {
            return Err(GenerationError::MalformedResponse {
                reason: err.message,
            }
            .into());
        }

        let text: String = response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    #[instrument(skip(self, request), fields(model = %request.model, prompt_len = request.prompt.len()))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = self.build_url(&request.model);
        let body = Self::build_body(request);

        debug!("Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            error!(status = %status, "Gemini API error");
            return Err(Self::map_status(status, &response_text, &request.model));
        }

        let text = Self::extract_text(&response_text)?;
        debug!(response_len = text.len(), "Received Gemini response");
        Ok(text)
    }
}
