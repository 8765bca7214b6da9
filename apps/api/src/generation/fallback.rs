//! Model fallback chain — an ordered list of models tried strictly in sequence.
//!
//! Each link names the failure signature that allows advancing to the next
//! link. Any other failure, or a failure on the last link, is terminal.
//! Attempts are never retried against the same model and never run in parallel.

use tracing::{error, info, warn};

use crate::generation::prompts::PromptPair;
use crate::llm_client::{
    Completion, CompletionProvider, GenerationParams, ModelSpec, ProviderFailure, TokenParam,
};

/// Failure signature that lets the chain move on to the next link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOn {
    /// The model identifier is unknown or unavailable.
    ModelUnavailable,
    /// The provider rejected the output-length parameter name this link used.
    TokenParamRejected,
}

impl AdvanceOn {
    fn matches(self, failure: &ProviderFailure, model: &ModelSpec) -> bool {
        match self {
            AdvanceOn::ModelUnavailable => failure.is_model_unavailable(),
            AdvanceOn::TokenParamRejected => failure.rejects_parameter(model.token_param),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    pub model: ModelSpec,
    /// `None` makes every failure of this link terminal.
    pub advance_on: Option<AdvanceOn>,
}

#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Success(Completion),
    RetryableFailure(ProviderFailure),
    TerminalFailure(ProviderFailure),
}

/// One provider call within a request.
#[derive(Debug, Clone)]
pub struct CompletionAttempt {
    pub model_id: String,
    pub outcome: AttemptOutcome,
}

/// Trace of a chain run. The last attempt is either a success or a terminal failure.
#[derive(Debug, Clone, Default)]
pub struct ChainRun {
    pub attempts: Vec<CompletionAttempt>,
}

impl ChainRun {
    /// The model that answered and its completion, or the failure that ended the chain.
    pub fn into_result(self) -> Result<(String, Completion), ProviderFailure> {
        match self.attempts.into_iter().last() {
            Some(CompletionAttempt {
                model_id,
                outcome: AttemptOutcome::Success(completion),
            }) => Ok((model_id, completion)),
            Some(CompletionAttempt {
                outcome: AttemptOutcome::TerminalFailure(failure) | AttemptOutcome::RetryableFailure(failure),
                ..
            }) => Err(failure),
            None => Err(ProviderFailure {
                status: None,
                code: None,
                message: "No models configured in the fallback chain".to_string(),
                error_type: None,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FallbackChain {
    links: Vec<ChainLink>,
}

impl Default for FallbackChain {
    /// gpt-5-mini → gpt-4o-mini (on model unavailability) → gpt-3.5-turbo with
    /// the legacy `max_tokens` spelling (on parameter rejection).
    fn default() -> Self {
        Self::new(vec![
            ChainLink {
                model: ModelSpec::new("gpt-5-mini", TokenParam::MaxCompletionTokens),
                advance_on: Some(AdvanceOn::ModelUnavailable),
            },
            ChainLink {
                model: ModelSpec::new("gpt-4o-mini", TokenParam::MaxCompletionTokens),
                advance_on: Some(AdvanceOn::TokenParamRejected),
            },
            ChainLink {
                model: ModelSpec::new("gpt-3.5-turbo", TokenParam::MaxTokens),
                advance_on: None,
            },
        ])
    }
}

impl FallbackChain {
    pub fn new(links: Vec<ChainLink>) -> Self {
        Self { links }
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    /// Walks the chain until a link succeeds or fails terminally.
    /// Prompts and sampling parameters are identical for every attempt.
    pub async fn run(
        &self,
        provider: &dyn CompletionProvider,
        prompts: &PromptPair,
        params: &GenerationParams,
    ) -> ChainRun {
        let mut run = ChainRun::default();

        for (index, link) in self.links.iter().enumerate() {
            info!(
                "Requesting completion from {} (attempt {}/{}, {})",
                link.model.id,
                index + 1,
                self.links.len(),
                link.model.token_param.as_str()
            );

            let result = provider
                .complete(
                    &link.model,
                    &prompts.system_prompt,
                    &prompts.user_prompt,
                    params,
                )
                .await;

            let failure = match result {
                Ok(completion) => {
                    run.attempts.push(CompletionAttempt {
                        model_id: link.model.id.clone(),
                        outcome: AttemptOutcome::Success(completion),
                    });
                    return run;
                }
                Err(failure) => failure,
            };

            let has_next = index + 1 < self.links.len();
            let retryable = has_next
                && link
                    .advance_on
                    .is_some_and(|signature| signature.matches(&failure, &link.model));

            if retryable {
                warn!(
                    status = ?failure.status,
                    code = ?failure.code,
                    error_type = ?failure.error_type,
                    "{} failed ({}), falling back to {}",
                    link.model.id,
                    failure.message,
                    self.links[index + 1].model.id
                );
                run.attempts.push(CompletionAttempt {
                    model_id: link.model.id.clone(),
                    outcome: AttemptOutcome::RetryableFailure(failure),
                });
                continue;
            }

            error!(
                status = ?failure.status,
                code = ?failure.code,
                error_type = ?failure.error_type,
                "{} failed terminally: {}",
                link.model.id,
                failure.message
            );
            run.attempts.push(CompletionAttempt {
                model_id: link.model.id.clone(),
                outcome: AttemptOutcome::TerminalFailure(failure),
            });
            return run;
        }

        run
    }
}
