//! Request-level preparation: decode, clean and bound every field of a raw input.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::preparation::decode::decode_field;
use crate::preparation::text::{cleanup, estimate_tokens, take_chars, truncate_to_token_limit};

/// Per-field ceilings. Résumé and job description are bounded in estimated
/// tokens; supporting-info fields in characters.
#[derive(Debug, Clone, Copy)]
pub struct FieldLimits {
    pub resume_tokens: usize,
    pub job_description_tokens: usize,
    pub skills_chars: usize,
    pub achievements_chars: usize,
    pub preferences_chars: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            resume_tokens: 1250,
            job_description_tokens: 1000,
            skills_chars: 300,
            achievements_chars: 300,
            preferences_chars: 200,
        }
    }
}

/// Optional details the candidate wants emphasized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupportingInfo {
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub achievements: Option<String>,
    #[serde(default)]
    pub preferences: Option<String>,
}

/// Input exactly as the caller sent it. Text fields may be compressed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInput {
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub supporting_info: Option<SupportingInfo>,
}

/// Cleaned, bounded text with its estimated token count.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedText {
    pub text: String,
    pub tokens: usize,
    pub truncated: bool,
}

impl PreparedText {
    /// Cleans `raw` and bounds it to `max_tokens`.
    pub fn bounded(raw: &str, max_tokens: usize) -> Self {
        let cleaned = cleanup(raw);
        let text = truncate_to_token_limit(&cleaned, max_tokens);
        Self {
            tokens: estimate_tokens(&text),
            truncated: text != cleaned,
            text,
        }
    }
}

/// Supporting info after cleanup; absent fields become empty strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedSupportingInfo {
    pub skills: String,
    pub achievements: String,
    pub preferences: String,
}

impl PreparedSupportingInfo {
    pub fn from_raw(info: Option<&SupportingInfo>, limits: &FieldLimits) -> Self {
        let field = |value: Option<&String>, max_chars: usize| {
            value
                .map(|v| take_chars(&cleanup(v), max_chars))
                .unwrap_or_default()
        };

        match info {
            Some(info) => Self {
                skills: field(info.skills.as_ref(), limits.skills_chars),
                achievements: field(info.achievements.as_ref(), limits.achievements_chars),
                preferences: field(info.preferences.as_ref(), limits.preferences_chars),
            },
            None => Self::default(),
        }
    }

    /// All three fields joined by single spaces, as counted by the budget gate.
    pub fn joined(&self) -> String {
        [
            self.skills.as_str(),
            self.achievements.as_str(),
            self.preferences.as_str(),
        ]
        .join(" ")
    }
}

/// Every field of a request, ready to be embedded in a prompt.
#[derive(Debug, Clone)]
pub struct PreparedInput {
    pub resume: PreparedText,
    pub job_description: PreparedText,
    pub supporting: PreparedSupportingInfo,
}

/// Decodes, cleans and bounds a raw request.
///
/// Fails with a validation error when the résumé or job description is
/// missing or blank after decompression.
pub fn prepare_input(raw: &RawInput, limits: &FieldLimits) -> Result<PreparedInput, AppError> {
    let resume = require_field(raw.resume_text.as_deref())?;
    let job_description = require_field(raw.job_description.as_deref())?;

    Ok(PreparedInput {
        resume: PreparedText::bounded(&resume, limits.resume_tokens),
        job_description: PreparedText::bounded(&job_description, limits.job_description_tokens),
        supporting: PreparedSupportingInfo::from_raw(raw.supporting_info.as_ref(), limits),
    })
}

fn require_field(value: Option<&str>) -> Result<String, AppError> {
    let decoded = value.map(decode_field).unwrap_or_default();
    if decoded.trim().is_empty() {
        return Err(AppError::Validation(
            "Resume and job description are required".to_string(),
        ));
    }
    Ok(decoded)
}
