//! Shared Types
//!
//! Error types and small utilities used across the crate.

pub mod error;

pub use error::{PlatoError, Result, SchemaError};

/// Truncate a string to at most `max_chars` characters, on a char boundary.
///
/// Prompt excerpts are capped this way so a large upload never blows the
/// context window of a generative call.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_short_input() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_chars_long_input() {
        assert_eq!(truncate_chars("hello world", 5), "hello");
    }

    #[test]
    fn test_truncate_chars_multibyte_boundary() {
        let s = "héllo wörld";
        let t = truncate_chars(s, 6);
        assert_eq!(t.chars().count(), 6);
    }
}
