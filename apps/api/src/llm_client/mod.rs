/// LLM Client — the single point of entry for all completion-provider calls.
///
/// ARCHITECTURAL RULE: No other module may call the provider API directly.
/// The generation pipeline only sees the `CompletionProvider` trait, so tests
/// can script provider behavior without network access.
///
/// No retries happen here. Model fallback is decided by the caller.
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 120;

// ────────────────────────────────────────────────────────────────────────────
// Request shape shared by every provider backend
// ────────────────────────────────────────────────────────────────────────────

/// Name under which a model family accepts the output-length limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenParam {
    /// Current chat models.
    MaxCompletionTokens,
    /// Legacy chat models.
    MaxTokens,
}

impl TokenParam {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenParam::MaxCompletionTokens => "max_completion_tokens",
            TokenParam::MaxTokens => "max_tokens",
        }
    }
}

/// A model identifier plus the parameter spelling it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub id: String,
    pub token_param: TokenParam,
}

impl ModelSpec {
    pub fn new(id: impl Into<String>, token_param: TokenParam) -> Self {
        Self {
            id: id.into(),
            token_param,
        }
    }
}

/// Sampling parameters held constant across every attempt of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.75,
            max_output_tokens: 700,
            presence_penalty: 0.3,
            frequency_penalty: 0.3,
        }
    }
}

/// A successful provider response. `content` may still be absent or empty.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub content: Option<String>,
    /// Provider token-usage fields, passed through untouched.
    pub usage: Map<String, Value>,
}

// ────────────────────────────────────────────────────────────────────────────
// Failures
// ────────────────────────────────────────────────────────────────────────────

/// A failed provider call with enough detail to classify and diagnose it.
#[derive(Debug, Clone, Error)]
#[error("provider error (status {status:?}, code {code:?}): {message}")]
pub struct ProviderFailure {
    /// HTTP status, absent for transport failures.
    pub status: Option<u16>,
    pub code: Option<String>,
    pub message: String,
    pub error_type: Option<String>,
}

impl ProviderFailure {
    fn code_is(&self, expected: &str) -> bool {
        self.code.as_deref() == Some(expected)
    }

    pub fn is_quota_exhausted(&self) -> bool {
        self.status == Some(402) || self.code_is("insufficient_quota")
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == Some(429) || self.code_is("rate_limit_exceeded")
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    /// The provider explicitly reported an unknown model.
    pub fn is_model_not_found(&self) -> bool {
        self.status == Some(404) || self.code_is("model_not_found")
    }

    /// The failure points at the model identifier itself rather than the
    /// account. Auth, quota and rate-limit failures never qualify, even when
    /// their message names a model.
    pub fn is_model_unavailable(&self) -> bool {
        if self.is_unauthorized() || self.is_quota_exhausted() || self.is_rate_limited() {
            return false;
        }
        self.is_model_not_found() || self.message.to_lowercase().contains("model")
    }

    /// The provider refused the named request parameter.
    pub fn rejects_parameter(&self, param: TokenParam) -> bool {
        self.message.contains(param.as_str())
    }
}

impl From<reqwest::Error> for ProviderFailure {
    fn from(e: reqwest::Error) -> Self {
        ProviderFailure {
            status: e.status().map(|s| s.as_u16()),
            code: None,
            message: e.to_string(),
            error_type: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provider seam
// ────────────────────────────────────────────────────────────────────────────

/// The completion provider trait. Implement this to swap backends without
/// touching the generation pipeline or handlers.
///
/// Carried in the generator as `Arc<dyn CompletionProvider>`.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        model: &ModelSpec,
        system_prompt: &str,
        user_prompt: &str,
        params: &GenerationParams,
    ) -> Result<Completion, ProviderFailure>;
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI-compatible chat completions backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    presence_penalty: f32,
    frequency_penalty: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<Value>,
}

/// Chat completions client for the OpenAI API (or any compatible endpoint).
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .context("Failed to build HTTP client")?,
            api_key,
            base_url,
        })
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(
        &self,
        model: &ModelSpec,
        system_prompt: &str,
        user_prompt: &str,
        params: &GenerationParams,
    ) -> Result<Completion, ProviderFailure> {
        let body = build_chat_request(model, system_prompt, user_prompt, params);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error_body(status.as_u16(), &body));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);
        let usage = chat.usage.unwrap_or_default();

        debug!(usage = ?usage, "Completion from {} succeeded", model.id);

        Ok(Completion { content, usage })
    }
}

fn build_chat_request<'a>(
    model: &'a ModelSpec,
    system_prompt: &'a str,
    user_prompt: &'a str,
    params: &GenerationParams,
) -> ChatRequest<'a> {
    let (max_completion_tokens, max_tokens) = match model.token_param {
        TokenParam::MaxCompletionTokens => (Some(params.max_output_tokens), None),
        TokenParam::MaxTokens => (None, Some(params.max_output_tokens)),
    };

    ChatRequest {
        model: &model.id,
        messages: [
            ChatMessage {
                role: "system",
                content: system_prompt,
            },
            ChatMessage {
                role: "user",
                content: user_prompt,
            },
        ],
        temperature: params.temperature,
        max_completion_tokens,
        max_tokens,
        presence_penalty: params.presence_penalty,
        frequency_penalty: params.frequency_penalty,
    }
}

/// Builds a failure from a non-2xx response, falling back to the raw body
/// when it is not a structured provider error.
fn parse_error_body(status: u16, body: &str) -> ProviderFailure {
    match serde_json::from_str::<OpenAiError>(body) {
        Ok(parsed) => ProviderFailure {
            status: Some(status),
            code: parsed.error.code.and_then(|c| match c {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            }),
            message: parsed.error.message,
            error_type: parsed.error.error_type,
        },
        Err(_) => ProviderFailure {
            status: Some(status),
            code: None,
            message: body.to_string(),
            error_type: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(status: Option<u16>, code: Option<&str>, message: &str) -> ProviderFailure {
        ProviderFailure {
            status,
            code: code.map(str::to_string),
            message: message.to_string(),
            error_type: None,
        }
    }

    #[test]
    fn test_request_uses_max_completion_tokens_for_current_models() {
        let model = ModelSpec::new("gpt-5-mini", TokenParam::MaxCompletionTokens);
        let body = build_chat_request(&model, "sys", "user", &GenerationParams::default());
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["model"], "gpt-5-mini");
        assert_eq!(json["max_completion_tokens"], 700);
        assert!(json.get("max_tokens").is_none());
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "sys");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "user");
    }

    #[test]
    fn test_request_uses_max_tokens_for_legacy_models() {
        let model = ModelSpec::new("gpt-3.5-turbo", TokenParam::MaxTokens);
        let body = build_chat_request(&model, "sys", "user", &GenerationParams::default());
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["max_tokens"], 700);
        assert!(json.get("max_completion_tokens").is_none());
        assert!((json["temperature"].as_f64().unwrap() - 0.75).abs() < 1e-6);
        assert!((json["presence_penalty"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert!((json["frequency_penalty"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_parse_structured_error_body() {
        let body = r#"{"error": {"message": "The model `gpt-5-mini` does not exist", "type": "invalid_request_error", "param": null, "code": "model_not_found"}}"#;
        let failure = parse_error_body(404, body);
        assert_eq!(failure.status, Some(404));
        assert_eq!(failure.code.as_deref(), Some("model_not_found"));
        assert_eq!(failure.error_type.as_deref(), Some("invalid_request_error"));
        assert!(failure.message.contains("does not exist"));
    }

    #[test]
    fn test_parse_error_body_with_null_code() {
        let body = r#"{"error": {"message": "Server error", "type": "server_error", "code": null}}"#;
        let failure = parse_error_body(500, body);
        assert!(failure.code.is_none());
    }

    #[test]
    fn test_parse_unstructured_error_body() {
        let failure = parse_error_body(502, "Bad Gateway");
        assert_eq!(failure.status, Some(502));
        assert_eq!(failure.message, "Bad Gateway");
    }

    #[test]
    fn test_model_unavailable_signatures() {
        assert!(failure(Some(404), None, "Not found").is_model_unavailable());
        assert!(failure(Some(400), Some("model_not_found"), "nope").is_model_unavailable());
        assert!(failure(Some(400), None, "Invalid model requested").is_model_unavailable());
        assert!(!failure(Some(400), None, "Invalid temperature").is_model_unavailable());
    }

    #[test]
    fn test_account_failures_are_never_model_unavailable() {
        assert!(!failure(Some(429), None, "Rate limit reached for model gpt-5-mini")
            .is_model_unavailable());
        assert!(!failure(Some(401), None, "Incorrect API key for model access")
            .is_model_unavailable());
        assert!(!failure(Some(429), Some("insufficient_quota"), "quota exceeded for model")
            .is_model_unavailable());
    }

    /// Serves a single canned `/chat/completions` response on a local port.
    async fn stub_endpoint(status: u16, body: serde_json::Value) -> String {
        use axum::{http::StatusCode, routing::post, Json, Router};

        let status = StatusCode::from_u16(status).unwrap();
        let app = Router::new().route(
            "/chat/completions",
            post(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_complete_returns_content_and_usage() {
        let base_url = stub_endpoint(
            200,
            serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "Dear Team" } }],
                "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
            }),
        )
        .await;
        let client = LlmClient::new("test-key".to_string(), base_url).unwrap();
        let model = ModelSpec::new("gpt-5-mini", TokenParam::MaxCompletionTokens);

        let completion = client
            .complete(&model, "sys", "user", &GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(completion.content.as_deref(), Some("Dear Team"));
        assert_eq!(completion.usage["total_tokens"], 15);
    }

    #[tokio::test]
    async fn test_complete_maps_error_status() {
        let base_url = stub_endpoint(
            429,
            serde_json::json!({
                "error": { "message": "Rate limit reached", "type": "requests", "code": "rate_limit_exceeded" }
            }),
        )
        .await;
        let client = LlmClient::new("test-key".to_string(), base_url).unwrap();
        let model = ModelSpec::new("gpt-5-mini", TokenParam::MaxCompletionTokens);

        let failure = client
            .complete(&model, "sys", "user", &GenerationParams::default())
            .await
            .unwrap_err();

        assert_eq!(failure.status, Some(429));
        assert!(failure.is_rate_limited());
    }

    #[test]
    fn test_rejects_parameter() {
        let f = failure(
            Some(400),
            Some("unsupported_parameter"),
            "Unsupported parameter: 'max_completion_tokens' is not supported with this model.",
        );
        assert!(f.rejects_parameter(TokenParam::MaxCompletionTokens));
        assert!(!f.rejects_parameter(TokenParam::MaxTokens));
    }
}
