//! Context extraction — best-effort hints used to personalize the prompt.
//!
//! Each heuristic is an independent pure function over a string. None of them
//! can fail: no match simply yields `None` (or `Industry::General`).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Coarse industry bucket for the target role. Drives tone guidance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    Technology,
    Sales,
    Marketing,
    Finance,
    #[default]
    General,
}

impl Industry {
    pub fn as_str(self) -> &'static str {
        match self {
            Industry::Technology => "technology",
            Industry::Sales => "sales",
            Industry::Marketing => "marketing",
            Industry::Finance => "finance",
            Industry::General => "general",
        }
    }
}

/// Heuristically derived hints. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContext {
    pub company_name: Option<String>,
    pub role_name: Option<String>,
    pub industry: Industry,
    pub years_experience: Option<u32>,
}

static COMPANY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:at|for|join)\s+([A-Z][A-Za-z0-9\s&,.-]{2,30}?)(?:\s+as|\s+is|\s+seeks|\.|,)")
        .unwrap()
});

/// Tried in order; the first match wins.
static ROLE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // explicit marker: "Position: ...", "hiring ...", "looking for ..."
        Regex::new(
            r"(?i)(?:position|role|job|title|hiring|seeking|looking for)[:]*\s*([A-Za-z\s&/-]{3,50}?)(?:\n|\.|\||-|,|to)",
        )
        .unwrap(),
        // title on the leading line
        Regex::new(r"(?i)^([A-Za-z\s&/-]{3,50}?)(?:\n|at|with)").unwrap(),
        // "as a ROLE" / "as an ROLE"
        Regex::new(r"(?i)(?:as a|as an)\s+([A-Za-z\s&/-]{3,50}?)(?:\.|,|\n|$)").unwrap(),
    ]
});

/// Priority order matters: a description matching several sets takes the first.
static INDUSTRY_KEYWORDS: LazyLock<[(Industry, Regex); 4]> = LazyLock::new(|| {
    [
        (
            Industry::Technology,
            Regex::new(
                r"(?i)react|node|javascript|python|aws|cloud|api|frontend|backend|full.?stack|software|developer|engineer",
            )
            .unwrap(),
        ),
        (
            Industry::Sales,
            Regex::new(r"(?i)sales|revenue|quota|pipeline|crm|account|customer|b2b|saas").unwrap(),
        ),
        (
            Industry::Marketing,
            Regex::new(r"(?i)marketing|brand|content|seo|campaign|digital|social media|analytics")
                .unwrap(),
        ),
        (
            Industry::Finance,
            Regex::new(r"(?i)financial|accounting|budget|audit|compliance|risk|investment").unwrap(),
        ),
    ]
});

static YEARS_EXPERIENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9]+)\+?\s*years?\s*(?:of\s*)?experience").unwrap());

/// Company name: a capitalized phrase after "at/for/join", ending at a boundary.
pub fn extract_company(job_description: &str) -> Option<String> {
    COMPANY
        .captures(job_description)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn extract_role(job_description: &str) -> Option<String> {
    ROLE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(job_description)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    })
}

pub fn classify_industry(job_description: &str) -> Industry {
    INDUSTRY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.is_match(job_description))
        .map(|(industry, _)| *industry)
        .unwrap_or_default()
}

/// Years of experience claimed in the résumé. `None` when absent or too large for a `u32`.
pub fn extract_years_experience(resume: &str) -> Option<u32> {
    YEARS_EXPERIENCE
        .captures(resume)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Runs every heuristic. Company, role and industry read the job description;
/// experience reads the résumé.
pub fn extract_context(resume: &str, job_description: &str) -> ExtractedContext {
    ExtractedContext {
        company_name: extract_company(job_description),
        role_name: extract_role(job_description),
        industry: classify_industry(job_description),
        years_experience: extract_years_experience(resume),
    }
}
