//! Decompression gate for incoming text fields.
//!
//! The browser may send fields compressed with LZ-String's UTF-16 encoding.
//! Anything that cannot be decoded is used as-is, so raw callers keep working.

use tracing::debug;

/// Every code unit emitted by the UTF-16 encoding is a 15-bit value offset by 32.
const COMPRESSED_UNIT_MIN: u32 = 32;
const COMPRESSED_UNIT_MAX: u32 = 32 + 0x7FFF;

/// Returns the plain text of a request field.
///
/// Fields starting with `{` are treated as plain text. Otherwise decompression
/// is attempted and the raw string is returned when it yields nothing usable
/// or the result does not round-trip to `raw`.
pub fn decode_field(raw: &str) -> String {
    if raw.is_empty() || raw.starts_with('{') || !in_compressed_alphabet(raw) {
        return raw.to_string();
    }

    // Decompression accepts most plain text and returns noise for it, so a
    // decode only counts when it compresses back to the exact payload.
    let decoded = lz_str::decompress_from_utf16(raw)
        .and_then(|units| String::from_utf16(&units).ok())
        .filter(|text| !text.is_empty())
        .filter(|text| lz_str::compress_to_utf16(text.as_str()) == raw);

    match decoded {
        Some(text) => {
            debug!(
                "Decompressed field: {} -> {} chars ({}% saved)",
                raw.chars().count(),
                text.chars().count(),
                compression_ratio(&text, raw)
            );
            text
        }
        None => raw.to_string(),
    }
}

/// Percentage of characters saved by compression, rounded to the nearest integer.
/// Zero when either side is empty.
pub fn compression_ratio(original: &str, compressed: &str) -> i64 {
    let original_len = original.encode_utf16().count();
    let compressed_len = compressed.encode_utf16().count();
    if original_len == 0 || compressed_len == 0 {
        return 0;
    }
    ((1.0 - compressed_len as f64 / original_len as f64) * 100.0).round() as i64
}

/// A compressed payload can only contain units in `32..=32799`; a newline or
/// tab rules it out.
fn in_compressed_alphabet(raw: &str) -> bool {
    raw.encode_utf16()
        .all(|unit| (COMPRESSED_UNIT_MIN..=COMPRESSED_UNIT_MAX).contains(&u32::from(unit)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "Jane Doe\n5 years experience in React development.\n\nLed a team of 4.";

    #[test]
    fn test_decode_compressed_field() {
        let compressed = lz_str::compress_to_utf16(RESUME);
        assert_ne!(compressed, RESUME);
        assert_eq!(decode_field(&compressed), RESUME);
    }

    #[test]
    fn test_decode_json_sidecar_untouched() {
        let raw = r#"{"name": "Jane Doe"}"#;
        assert_eq!(decode_field(raw), raw);
    }

    #[test]
    fn test_decode_text_with_newlines_untouched() {
        assert_eq!(decode_field(RESUME), RESUME);
        assert_eq!(decode_field("tab\tseparated"), "tab\tseparated");
    }

    #[test]
    fn test_decode_empty_is_empty() {
        assert_eq!(decode_field(""), "");
    }

    #[test]
    fn test_decode_plain_single_line_untouched() {
        for raw in [
            "x",
            "Hello world",
            "We are hiring",
            "ABCDEFG 12345",
            "Jane Doe, 5 years experience in React development",
            "Senior Rust Engineer at Globex",
            "Ingénieur logiciel à Paris",
        ] {
            assert_eq!(decode_field(raw), raw);
        }
    }

    #[test]
    fn test_decode_compressed_single_line() {
        let job = "Senior Rust Engineer at Globex";
        assert_eq!(decode_field(&lz_str::compress_to_utf16(job)), job);
    }

    #[test]
    fn test_compressed_alphabet() {
        assert!(in_compressed_alphabet("plain ascii"));
        assert!(!in_compressed_alphabet("line\nbreak"));
        assert!(in_compressed_alphabet(&lz_str::compress_to_utf16(RESUME)));
    }

    #[test]
    fn test_compression_ratio() {
        assert_eq!(compression_ratio("", "abc"), 0);
        assert_eq!(compression_ratio("abcd", ""), 0);
        assert_eq!(compression_ratio("abcdefghij", "abcde"), 50);
        assert_eq!(compression_ratio("abcd", "abcdefgh"), -100);
    }
}
