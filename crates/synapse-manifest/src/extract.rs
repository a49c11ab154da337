//! Response extraction
//!
//! Models often wrap JSON in markdown fences or surround it with prose.
//! [`extract_json`] pulls out the first fenced object and otherwise returns
//! the trimmed input unchanged. It never fails; unparsable output is left
//! for the validator to reject.

use regex::Regex;
use std::sync::OnceLock;

/// Fenced block, optionally tagged `json`, holding a brace-delimited object
fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)```(?:json)?\s*(\{.*?\})\s*```").expect("fence pattern is valid")
    })
}

/// Best-effort JSON substring of a raw model response
#[must_use]
pub fn extract_json(raw: &str) -> &str {
    match fence_pattern().captures(raw).and_then(|c| c.get(1)) {
        Some(inner) => {
            tracing::debug!(len = inner.len(), "Found JSON wrapped in markdown fences");
            inner.as_str().trim()
        }
        None => {
            tracing::debug!("No markdown fences around JSON, using trimmed response");
            raw.trim()
        }
    }
}

/// Short preview of a response for logs
///
/// Cuts on a char boundary at most `max` bytes in.
#[must_use]
pub fn preview(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
