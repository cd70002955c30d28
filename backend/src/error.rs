//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// Each variant implements automatic conversion to HTTP responses via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request is missing a required field or carries an invalid value
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Message store query or write failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status code this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

/// Errors raised while talking to the external conversational model
///
/// These never reach HTTP clients: the conversation bridge converts them
/// into a fallback reply.
#[derive(Error, Debug)]
pub enum ModelError {
    /// HTTP request could not be sent or the connection failed
    #[error("Failed to send request to model API: {0}")]
    Transport(#[from] reqwest::Error),

    /// Model API answered with HTTP 429
    #[error("Model API rate limit exceeded (HTTP 429): {0}")]
    RateLimited(String),

    /// Model API answered with a non-success status
    #[error("Model API returned error status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as far as it could be read
        body: String,
    },

    /// Response body was not the expected JSON shape
    #[error("Failed to parse JSON response from model API: {0}")]
    MalformedResponse(String),

    /// The prompt was rejected by the model's safety filters
    #[error("Model API blocked the prompt: {0}")]
    Blocked(String),

    /// Response parsed but carried no usable text
    #[error("Model API response contains no text: {0}")]
    EmptyResponse(String),
}
