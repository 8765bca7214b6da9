//! Axum route handlers for the Generation API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::context::ExtractedContext;
use crate::generation::generator::GenerationResult;
use crate::preparation::RawInput;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub cover_letter: String,
    pub usage: UsageReport,
}

/// Provider usage fields plus which model answered and what context was detected.
#[derive(Debug, Serialize)]
pub struct UsageReport {
    #[serde(flatten)]
    pub provider: Map<String, Value>,
    pub model: String,
    pub context: ExtractedContext,
    pub timestamp: DateTime<Utc>,
}

impl From<GenerationResult> for GenerateResponse {
    fn from(result: GenerationResult) -> Self {
        let mut provider = result.usage;
        // Our own fields win over any provider field with the same name.
        for key in ["model", "context", "timestamp"] {
            provider.remove(key);
        }

        GenerateResponse {
            cover_letter: result.cover_letter,
            usage: UsageReport {
                provider,
                model: result.model_used,
                context: result.context,
                timestamp: result.timestamp,
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate
///
/// Generates a cover letter from a résumé and job description.
/// Text fields may be LZ-String compressed (UTF-16 encoding).
/// Malformed bodies are reported through the same `{ error }` shape as every other failure.
pub async fn handle_generate(
    State(state): State<AppState>,
    payload: Result<Json<RawInput>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    let span = info_span!("generate", request_id = %Uuid::new_v4());
    let result = state.generator.generate(&request).instrument(span).await?;

    Ok(Json(result.into()))
}
