//! Gemini API client
//!
//! Direct HTTP client for the Gemini `generateContent` endpoint.

use crate::config::{AiConfig, DEFAULT_GEMINI_API_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::error::ModelError;
use crate::gemini::types::{Content, GenerateContentRequest, GenerateContentResponse};
use std::time::Duration;

/// HTTP client bound to one API key and model
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client with the default model and endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_http(
            reqwest::Client::new(),
            api_key,
            DEFAULT_GEMINI_MODEL,
            DEFAULT_GEMINI_API_BASE_URL,
        )
    }

    /// Create a client from an explicit HTTP client, model and base URL
    pub fn with_http(
        http: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build a client from configuration
    ///
    /// Returns `Ok(None)` when no API key is configured.
    pub fn from_config(config: &AiConfig) -> Result<Option<Self>, reqwest::Error> {
        let Some(api_key) = config.api_key.as_deref() else {
            return Ok(None);
        };

        // Shared client (connection pooling) with a per-request timeout
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Some(Self::with_http(
            http,
            api_key,
            config.model.as_str(),
            config.api_base_url.as_str(),
        )))
    }

    /// Model name requests are sent to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the conversation so far and return the text of the model's next turn
    ///
    /// # Errors
    /// * `ModelError::Transport` if the request could not be sent or the body read
    /// * `ModelError::RateLimited` / `ModelError::Status` for non-success statuses
    /// * `ModelError::MalformedResponse` if the body is not valid JSON
    /// * `ModelError::Blocked` / `ModelError::EmptyResponse` if no text came back
    pub async fn generate(&self, contents: &[Content]) -> Result<String, ModelError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        tracing::debug!(
            url = %url,
            model = %self.model,
            turns = contents.len(),
            "Calling Gemini API"
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateContentRequest { contents })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            tracing::error!(
                status_code = status_code,
                error_body = %error_body,
                "Gemini API returned error status"
            );

            if status_code == 429 {
                return Err(ModelError::RateLimited(error_body));
            }

            return Err(ModelError::Status {
                status: status_code,
                body: error_body,
            });
        }

        let response_body = response.text().await?;

        let parsed: GenerateContentResponse =
            serde_json::from_str(&response_body).map_err(|e| {
                ModelError::MalformedResponse(format!("{} - Response body: {}", e, response_body))
            })?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_ref())
        {
            return Err(ModelError::Blocked(reason.clone()));
        }

        let candidate = parsed
            .candidates
            .first()
            .ok_or_else(|| ModelError::EmptyResponse("no candidates".to_string()))?;

        let text: String = candidate
            .content
            .as_ref()
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate
                .finish_reason
                .clone()
                .unwrap_or_else(|| "empty text".to_string());
            return Err(ModelError::EmptyResponse(reason));
        }

        tracing::debug!(
            response_len = text.len(),
            "Successfully received response from Gemini API"
        );

        Ok(text)
    }
}
