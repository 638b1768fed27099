// File: src/parser/closer.rs
//! Speculative closing of a half-written JSON object.
//!
//! Model output rarely stops on a JSON token boundary, but a prefix of a flat
//! object usually differs from valid JSON by a short suffix: an unterminated
//! string and the closing brace. A `Closer` guesses that suffix so every
//! fragment can yield a preview.

/// Strategy deciding whether a buffer can stand in for a JSON object.
pub trait Closer: Send + Sync {
    /// Returns a closed JSON document for `buffer`, or `None` to defer until
    /// more text arrives. `is_new` is false while the buffer continues a
    /// record that was already previewed.
    fn close(&self, buffer: &str, is_new: bool) -> Option<String>;
}

/// Suffix heuristic tuned for flat objects of string fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuffixCloser;

impl SuffixCloser {
    fn synthesize(base: &str, is_new: bool) -> String {
        let mut out = String::with_capacity(base.len() + 32);
        out.push_str(base);
        out.push_str("\"complete\": false");
        if is_new {
            out.push_str(", \"new\": true");
        }
        out.push('}');
        out
    }
}

impl Closer for SuffixCloser {
    fn close(&self, buffer: &str, is_new: bool) -> Option<String> {
        // Value just finished: `..."day": "monday",`
        if buffer.ends_with("\",") {
            return Some(Self::synthesize(buffer, is_new));
        }

        // Next key just opened: `..."monday","`
        if let Some(stripped) = buffer.strip_suffix("\",\"") {
            return Some(Self::synthesize(&format!("{stripped}\","), is_new));
        }

        // Mid-value: `..."host": "Al`
        let probe = format!("{buffer}\"}}");
        if serde_json::from_str::<serde_json::Value>(&probe).is_ok() {
            return Some(Self::synthesize(&format!("{buffer}\","), is_new));
        }

        None
    }
}
