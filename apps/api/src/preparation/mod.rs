// Text Preparation
// Implements: decompression gate, whitespace cleanup, token estimation, per-field bounding.

pub mod decode;
pub mod input;
pub mod text;

pub use input::{prepare_input, FieldLimits, PreparedInput, RawInput};
pub use text::estimate_tokens;
