use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::ProviderFailure;

const GENERIC_FAILURE: &str = "Failed to generate cover letter. Please try again.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Input too long: ~{token_estimate} estimated tokens")]
    InputTooLong { token_estimate: usize },

    #[error("Provider rejected credentials")]
    Unauthorized,

    #[error("Provider quota exhausted")]
    QuotaExceeded,

    #[error("No model in the fallback chain is available")]
    ModelNotFound,

    #[error("Provider rate limit exceeded")]
    RateLimited,

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Provider returned no content (model: {model})")]
    EmptyContent { model: String },

    #[error("Provider error: {0}")]
    Provider(String),
}

impl From<ProviderFailure> for AppError {
    /// Maps a terminal provider failure onto the HTTP-facing taxonomy.
    fn from(failure: ProviderFailure) -> Self {
        if failure.is_quota_exhausted() {
            AppError::QuotaExceeded
        } else if failure.is_unauthorized() {
            AppError::Unauthorized
        } else if failure.is_rate_limited() {
            AppError::RateLimited
        } else if failure.is_model_not_found() {
            AppError::ModelNotFound
        } else if failure.status.is_some_and(|s| s >= 500) {
            AppError::ProviderUnavailable(failure.message)
        } else {
            AppError::Provider(failure.message)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut token_estimate = None;

        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InputTooLong {
                token_estimate: estimate,
            } => {
                token_estimate = Some(*estimate);
                (
                    StatusCode::BAD_REQUEST,
                    "Input is extremely long. Please reduce the length of your resume or job description."
                        .to_string(),
                )
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Invalid API key. Please check your OpenAI API key in environment variables."
                    .to_string(),
            ),
            AppError::QuotaExceeded => (
                StatusCode::PAYMENT_REQUIRED,
                "OpenAI quota exceeded. Please check your OpenAI account billing.".to_string(),
            ),
            AppError::ModelNotFound => (
                StatusCode::NOT_FOUND,
                "Model not found. Please ensure you have access to gpt-4o-mini or update to a valid model."
                    .to_string(),
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded. Please try again in a moment.".to_string(),
            ),
            AppError::ProviderUnavailable(msg) => {
                tracing::error!("Provider unavailable: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "OpenAI service is temporarily unavailable. Please try again.".to_string(),
                )
            }
            AppError::EmptyContent { model } => {
                tracing::error!("Provider returned no content (model: {model})");
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
            AppError::Provider(msg) => {
                tracing::error!("Unclassified provider error: {msg}");
                let message = if msg.trim().is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    msg.clone()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        let body = match token_estimate {
            Some(estimate) => json!({ "error": message, "tokenEstimate": estimate }),
            None => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}
