//! Cover Letter Generation — orchestrates the full request pipeline.
//!
//! Flow: prepare_input → extract_context → token budget gate →
//!       build_prompt_pair → fallback chain → content check → result.
//!
//! The generator holds no per-request state; every call builds its own
//! values and discards them after responding.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::info;

use crate::errors::AppError;
use crate::generation::budget::TokenBudget;
use crate::generation::context::{extract_context, ExtractedContext};
use crate::generation::fallback::FallbackChain;
use crate::generation::prompts::build_prompt_pair;
use crate::llm_client::{CompletionProvider, GenerationParams};
use crate::preparation::{prepare_input, FieldLimits, RawInput};

/// The only value handed back to callers on success.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub cover_letter: String,
    pub model_used: String,
    /// Provider token-usage fields, untouched.
    pub usage: Map<String, Value>,
    pub context: ExtractedContext,
    pub timestamp: DateTime<Utc>,
}

pub struct CoverLetterGenerator {
    provider: Arc<dyn CompletionProvider>,
    chain: FallbackChain,
    params: GenerationParams,
    budget: TokenBudget,
    limits: FieldLimits,
}

impl CoverLetterGenerator {
    /// Default chain, sampling parameters and field limits with the given input ceiling.
    pub fn new(provider: Arc<dyn CompletionProvider>, max_input_tokens: usize) -> Self {
        Self {
            provider,
            chain: FallbackChain::default(),
            params: GenerationParams::default(),
            budget: TokenBudget::with_ceiling(max_input_tokens),
            limits: FieldLimits::default(),
        }
    }

    pub fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    /// Runs the pipeline for one request.
    ///
    /// Validation and budget failures return before the provider is called.
    pub async fn generate(&self, raw: &RawInput) -> Result<GenerationResult, AppError> {
        let input = prepare_input(raw, &self.limits)?;
        if input.resume.truncated || input.job_description.truncated {
            info!(
                "Input truncated to fit field limits (resume: {}, job description: {})",
                input.resume.truncated, input.job_description.truncated
            );
        }

        let context = extract_context(&input.resume.text, &input.job_description.text);

        let estimate = self.budget.estimate(&input);
        info!(
            resume = estimate.resume,
            job_description = estimate.job_description,
            supporting = estimate.supporting,
            input = estimate.total,
            max_output = self.params.max_output_tokens,
            total = estimate.total + self.params.max_output_tokens as usize,
            context = ?context,
            "Token usage estimate"
        );
        self.budget.check(estimate)?;

        let prompts = build_prompt_pair(&input, &context);

        let run = self
            .chain
            .run(self.provider.as_ref(), &prompts, &self.params)
            .await;
        let attempts = run.attempts.len();
        let (model_used, completion) = run.into_result()?;

        let cover_letter = completion
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AppError::EmptyContent {
                model: model_used.clone(),
            })?;

        info!(
            "Generated cover letter with {} after {} attempt(s) ({} chars)",
            model_used,
            attempts,
            cover_letter.chars().count()
        );

        Ok(GenerationResult {
            cover_letter,
            model_used,
            usage: completion.usage,
            context,
            timestamp: Utc::now(),
        })
    }
}
