//! Text normalization and token budgeting primitives.
//!
//! Token counts are estimates (`ceil(chars / 4)`), not tokenizer output. All
//! lengths are measured in `char`s so a cut never lands inside a code point.

use std::sync::LazyLock;

use regex::Regex;

/// Characters per estimated token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Joins head and tail when the middle of a long text is dropped.
pub const LONG_TRUNCATION_MARKER: &str = "\n...[truncated]...\n";
/// Appended when only the tail of a text is dropped.
pub const SHORT_TRUNCATION_MARKER: &str = "...[truncated]";

/// Horizontal whitespace: every whitespace character except `\n`.
static HORIZONTAL_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+").unwrap());
static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Collapses redundant whitespace while keeping paragraph breaks.
///
/// - runs of spaces/tabs become a single space
/// - 3+ consecutive newlines become exactly two
/// - leading/trailing whitespace is trimmed
pub fn cleanup(text: &str) -> String {
    let collapsed = HORIZONTAL_WS.replace_all(text, " ");
    let collapsed = EXCESS_NEWLINES.replace_all(&collapsed, "\n\n");
    collapsed.trim().to_string()
}

/// Rough token estimate: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Bounds `text` to roughly `max_tokens` estimated tokens.
///
/// Short overflows lose only the tail. Texts longer than twice the character
/// limit keep the first 60% and the last 40% of the limit and drop the middle.
pub fn truncate_to_token_limit(text: &str, max_tokens: usize) -> String {
    if estimate_tokens(text) <= max_tokens {
        return text.to_string();
    }

    let char_limit = max_tokens * CHARS_PER_TOKEN;
    let len = text.chars().count();

    if len > char_limit * 2 {
        let head_len = char_limit * 6 / 10;
        let tail_len = char_limit * 4 / 10;
        let head: String = text.chars().take(head_len).collect();
        let tail: String = text.chars().skip(len - tail_len).collect();
        return format!("{head}{LONG_TRUNCATION_MARKER}{tail}");
    }

    let head: String = text.chars().take(char_limit).collect();
    format!("{head}{SHORT_TRUNCATION_MARKER}")
}

/// Keeps at most `max_chars` characters of `text`.
pub fn take_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
