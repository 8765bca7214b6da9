// All LLM prompt templates for cover letter generation.
// Rendering is total: every combination of present/absent optional fields produces a prompt.

use crate::generation::context::{ExtractedContext, Industry};
use crate::preparation::PreparedInput;

/// System prompt — persona and style rules. Industry adaptation happens in the user prompt.
pub const COVER_LETTER_SYSTEM: &str = "\
You are an expert cover letter writer who creates compelling, authentic cover letters that get interviews.

Your writing principles:
- Write with genuine enthusiasm and personality - avoid corporate jargon
- Use powerful action verbs: spearheaded, orchestrated, pioneered, transformed, architected
- Include specific metrics and quantifiable achievements
- Create a narrative arc that tells a story, not just lists qualifications
- Mirror the company's tone from the job posting (formal vs casual, innovative vs traditional)
- Never use clichés like \"I am writing to apply\" or \"I am the perfect candidate\"
- Sound like a confident professional having a conversation, not a robot

Industry-specific adjustments:
- Technology: Focus on technical skills, problem-solving, innovation
- Sales: Emphasize revenue generation, relationship building, quota achievements
- Marketing: Highlight creativity, campaigns, ROI, brand development
- Finance: Stress accuracy, compliance, risk management, analytical skills
- General: Focus on leadership, adaptability, and transferable skills";

/// User prompt template.
/// Placeholders: {resume}, {job_description}, {supporting_sections}, {company},
///               {role}, {industry}, {experience}, {tone}
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Create an exceptional cover letter using this information:

CANDIDATE RESUME:
{resume}

TARGET POSITION:
{job_description}
{supporting_sections}
CONTEXT DETECTED:
- Company: {company}
- Role: {role}
- Industry: {industry}
- Candidate Experience Level: {experience}

STRUCTURE YOUR COVER LETTER:

PARAGRAPH 1 - The Hook (2-3 sentences):
- Start with something unexpected that shows you understand their specific needs
- Reference a specific challenge, opportunity, or aspect of the role that excites you
- Connect it to a unique insight or experience you bring
- Examples of strong openers:
  * "Your need for someone who can [specific challenge] immediately caught my attention because I recently [relevant achievement]."
  * "The intersection of [skill 1] and [skill 2] in your job posting perfectly describes my career trajectory."
  * "Having [specific achievement], I understand exactly what it takes to [job requirement]."

PARAGRAPH 2 - The Evidence (3-4 sentences):
- Present 2-3 specific achievements using the STAR method compressed into single sentences
- Each achievement should directly map to a job requirement
- Include numbers, percentages, or concrete outcomes
- Use this formula: "When [situation], I [action] resulting in [quantified result]."

PARAGRAPH 3 - The Vision (2-3 sentences):
- Paint a picture of what you'll accomplish in the role
- Reference specific projects, goals, or challenges mentioned in the posting
- Show you've thought about their needs beyond the job description
- Demonstrate cultural fit through your language and values alignment

PARAGRAPH 4 - The Close (2 sentences):
- Express genuine enthusiasm for a specific aspect of the role or company
- Include a confident, specific call to action
- Example: "I'd welcome the opportunity to discuss how my experience in [specific area] can help [company] achieve [specific goal]."

CRITICAL REQUIREMENTS:
- Total length: 250-350 words maximum
- Do NOT include any date lines, address blocks, or formal letter headers
- Start with a simple greeting (Dear [Company] Team or Dear Hiring Manager)
- End with a simple closing (Best regards, Sincerely, or Looking forward to connecting) followed by just the candidate's first and last name
- Write in {tone} tone
- Avoid any phrase that appears in typical AI-generated content
- Each sentence must add new information - no filler
- Use varied sentence lengths for rhythm
- Include at least 3 specific metrics or quantifiable achievements
- Never repeat phrases from the job description verbatim - rephrase intelligently
- Do not include contact information, as that will be handled by the application"#;

pub const SKILLS_LABEL: &str = "KEY SKILLS TO EMPHASIZE";
pub const ACHIEVEMENTS_LABEL: &str = "SPECIFIC ACHIEVEMENTS TO HIGHLIGHT";
pub const PREFERENCES_LABEL: &str = "WRITING STYLE PREFERENCES";

const UNKNOWN_COMPANY: &str = "Unknown (use position context clues)";
const UNKNOWN_ROLE: &str = "Based on description";
const UNKNOWN_EXPERIENCE: &str = "Determine from resume";

/// The system/user instruction pair sent with every attempt of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system_prompt: String,
    pub user_prompt: String,
}

/// Renders the prompt pair for a prepared request.
pub fn build_prompt_pair(input: &PreparedInput, context: &ExtractedContext) -> PromptPair {
    let supporting_sections = supporting_sections(input);
    let experience = context
        .years_experience
        .map(|years| format!("{years}+ years"))
        .unwrap_or_else(|| UNKNOWN_EXPERIENCE.to_string());

    let user_prompt = render(
        COVER_LETTER_PROMPT_TEMPLATE,
        &[
            ("resume", input.resume.text.as_str()),
            ("job_description", input.job_description.text.as_str()),
            ("supporting_sections", supporting_sections.as_str()),
            ("company", context.company_name.as_deref().unwrap_or(UNKNOWN_COMPANY)),
            ("role", context.role_name.as_deref().unwrap_or(UNKNOWN_ROLE)),
            ("industry", context.industry.as_str()),
            ("experience", experience.as_str()),
            ("tone", tone_for(context.industry)),
        ],
    );

    PromptPair {
        system_prompt: COVER_LETTER_SYSTEM.to_string(),
        user_prompt,
    }
}

pub fn tone_for(industry: Industry) -> &'static str {
    match industry {
        Industry::Technology => "a direct, innovative",
        Industry::Finance => "a professional, precise",
        _ => "an engaging, professional",
    }
}

/// One labeled block per non-empty supporting field; blank fields are omitted entirely.
fn supporting_sections(input: &PreparedInput) -> String {
    let blocks: Vec<String> = [
        (SKILLS_LABEL, &input.supporting.skills),
        (ACHIEVEMENTS_LABEL, &input.supporting.achievements),
        (PREFERENCES_LABEL, &input.supporting.preferences),
    ]
    .into_iter()
    .filter(|(_, value)| !value.trim().is_empty())
    .map(|(label, value)| format!("\n{label}: {value}\n"))
    .collect();

    blocks.concat()
}

/// Single-pass `{key}` substitution. Substituted values are never rescanned,
/// so user text containing `{...}` is embedded verbatim.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });

        match value {
            Some((v, close)) => {
                out.push_str(v);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
