//! Token budget gate — rejects clearly oversized requests before any provider call.

use crate::errors::AppError;
use crate::preparation::{estimate_tokens, PreparedInput};

/// Estimated tokens of the fixed system prompt.
pub const SYSTEM_PROMPT_OVERHEAD: usize = 250;
/// Estimated tokens of the user template around the embedded fields.
pub const USER_TEMPLATE_OVERHEAD: usize = 300;
/// Input ceiling used when `MAX_INPUT_TOKENS` is not set.
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 15_000;

/// Per-part breakdown of a request's estimated input size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenEstimate {
    pub resume: usize,
    pub job_description: usize,
    pub supporting: usize,
    pub total: usize,
}

/// Policy knob, not a provider limit.
#[derive(Debug, Clone, Copy)]
pub struct TokenBudget {
    pub system_overhead: usize,
    pub user_template_overhead: usize,
    pub ceiling: usize,
}

impl TokenBudget {
    pub fn with_ceiling(ceiling: usize) -> Self {
        Self {
            system_overhead: SYSTEM_PROMPT_OVERHEAD,
            user_template_overhead: USER_TEMPLATE_OVERHEAD,
            ceiling,
        }
    }

    pub fn estimate(&self, input: &PreparedInput) -> TokenEstimate {
        let resume = input.resume.tokens;
        let job_description = input.job_description.tokens;
        let supporting = estimate_tokens(&input.supporting.joined());

        TokenEstimate {
            resume,
            job_description,
            supporting,
            total: self.system_overhead
                + self.user_template_overhead
                + resume
                + job_description
                + supporting,
        }
    }

    /// Passes the estimate through when it fits under the ceiling.
    pub fn check(&self, estimate: TokenEstimate) -> Result<TokenEstimate, AppError> {
        if estimate.total > self.ceiling {
            return Err(AppError::InputTooLong {
                token_estimate: estimate.total,
            });
        }
        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preparation::input::{PreparedSupportingInfo, PreparedText};

    fn prepared(resume_chars: usize, job_chars: usize) -> PreparedInput {
        PreparedInput {
            resume: PreparedText::bounded(&"r".repeat(resume_chars), usize::MAX / 8),
            job_description: PreparedText::bounded(&"j".repeat(job_chars), usize::MAX / 8),
            supporting: PreparedSupportingInfo::default(),
        }
    }

    #[test]
    fn test_estimate_sums_overheads_and_fields() {
        let budget = TokenBudget::with_ceiling(DEFAULT_MAX_INPUT_TOKENS);
        let estimate = budget.estimate(&prepared(400, 200));
        assert_eq!(estimate.resume, 100);
        assert_eq!(estimate.job_description, 50);
        // three empty fields joined by spaces: "  " -> 1 token
        assert_eq!(estimate.supporting, 1);
        assert_eq!(estimate.total, 250 + 300 + 100 + 50 + 1);
    }

    #[test]
    fn test_default_ceiling_admits_capped_fields() {
        let budget = TokenBudget::with_ceiling(DEFAULT_MAX_INPUT_TOKENS);
        assert_eq!(budget.ceiling, 15_000);
        // résumé and job description at their field caps, supporting info full
        let mut input = prepared(1250 * 4, 1000 * 4);
        input.supporting = PreparedSupportingInfo {
            skills: "s".repeat(300),
            achievements: "a".repeat(300),
            preferences: "p".repeat(200),
        };
        assert!(budget.check(budget.estimate(&input)).is_ok());
    }

    #[test]
    fn test_check_accepts_at_ceiling() {
        let budget = TokenBudget::with_ceiling(701);
        let estimate = budget.estimate(&prepared(400, 200));
        assert_eq!(estimate.total, 701);
        assert!(budget.check(estimate).is_ok());
    }

    #[test]
    fn test_check_rejects_above_ceiling() {
        let budget = TokenBudget::with_ceiling(700);
        let estimate = budget.estimate(&prepared(400, 200));
        match budget.check(estimate) {
            Err(AppError::InputTooLong { token_estimate }) => assert_eq!(token_estimate, 701),
            other => panic!("expected InputTooLong, got {other:?}"),
        }
    }

    #[test]
    fn test_supporting_info_counts_toward_total() {
        let mut input = prepared(0, 0);
        input.supporting = PreparedSupportingInfo {
            skills: "s".repeat(300),
            achievements: "a".repeat(300),
            preferences: "p".repeat(200),
        };
        let estimate = TokenBudget::with_ceiling(DEFAULT_MAX_INPUT_TOKENS).estimate(&input);
        assert_eq!(estimate.supporting, 802_usize.div_ceil(4));
    }
}
