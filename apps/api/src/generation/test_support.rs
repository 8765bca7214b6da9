//! Scripted provider and failure fixtures shared by pipeline tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::llm_client::{
    Completion, CompletionProvider, GenerationParams, ModelSpec, ProviderFailure, TokenParam,
};

/// One recorded call to the scripted provider.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: ModelSpec,
    pub system_prompt: String,
    pub user_prompt: String,
    pub params: GenerationParams,
}

/// Replays queued responses in order and records every call.
/// Calls beyond the script fail with a 500.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<Completion, ProviderFailure>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<Completion, ProviderFailure>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn models_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.model.id).collect()
    }

    pub fn token_params_called(&self) -> Vec<TokenParam> {
        self.calls().into_iter().map(|c| c.model.token_param).collect()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(
        &self,
        model: &ModelSpec,
        system_prompt: &str,
        user_prompt: &str,
        params: &GenerationParams,
    ) -> Result<Completion, ProviderFailure> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.clone(),
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            params: params.clone(),
        });

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(failure(Some(500), None, "script exhausted")))
    }
}

pub fn usage() -> Map<String, Value> {
    match json!({ "prompt_tokens": 812, "completion_tokens": 344, "total_tokens": 1156 }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

pub fn completion(text: &str) -> Completion {
    Completion {
        content: Some(text.to_string()),
        usage: usage(),
    }
}

pub fn failure(status: Option<u16>, code: Option<&str>, message: &str) -> ProviderFailure {
    ProviderFailure {
        status,
        code: code.map(str::to_string),
        message: message.to_string(),
        error_type: Some("invalid_request_error".to_string()),
    }
}

pub fn model_not_found() -> ProviderFailure {
    failure(
        Some(404),
        Some("model_not_found"),
        "The model `gpt-5-mini` does not exist or you do not have access to it.",
    )
}

pub fn rate_limited() -> ProviderFailure {
    failure(
        Some(429),
        Some("rate_limit_exceeded"),
        "Rate limit reached for gpt-5-mini on requests per min.",
    )
}

pub fn param_rejected() -> ProviderFailure {
    failure(
        Some(400),
        Some("unsupported_parameter"),
        "Unsupported parameter: 'max_completion_tokens' is not supported. Use 'max_tokens' instead.",
    )
}
