//! Artifact Sanitation
//!
//! Textual repair pass for generated website source. The recovery engine
//! handles JSON; this is its counterpart for code text. Models wrap HTML
//! in markdown fences, prepend "Here is your site:", or leak chat markers
//! into the document - each known malformation gets one named rule, and
//! the rules run in a fixed order.
//!
//! Unlike JSON recovery (first success wins), every applicable rule is
//! applied: the repairs are independent and compose.

use tracing::debug;

use crate::constants::CONTROL_TOKENS;

/// Ordered textual repair rules for emitted document artifacts
pub struct ArtifactSanitizer {
    rules: Vec<(&'static str, fn(&str) -> Option<String>)>,
}

impl Default for ArtifactSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactSanitizer {
    pub fn new() -> Self {
        Self {
            rules: vec![
                ("strip_code_fence", strip_code_fence),
                ("strip_control_tokens", strip_control_tokens),
                ("trim_leading_prose", trim_leading_prose),
                ("trim_trailing_prose", trim_trailing_prose),
            ],
        }
    }

    /// Apply every applicable rule in order.
    ///
    /// Returns the repaired text and the names of the rules that fired.
    pub fn sanitize(&self, raw: &str) -> (String, Vec<&'static str>) {
        let mut text = raw.trim().to_string();
        let mut applied = Vec::new();

        for (name, rule) in &self.rules {
            if let Some(repaired) = rule(&text) {
                debug!("Artifact sanitation rule '{}' applied", name);
                text = repaired;
                applied.push(*name);
            }
        }

        (text, applied)
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Remove a markdown fence wrapping the whole document.
fn strip_code_fence(text: &str) -> Option<String> {
    if !text.starts_with("```") {
        return None;
    }

    let after_open = match text.find('\n') {
        Some(idx) => &text[idx + 1..],
        None => return None,
    };

    let interior = after_open
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(after_open);

    Some(interior.trim().to_string())
}

/// Remove chat-turn delimiters and channel markers.
fn strip_control_tokens(text: &str) -> Option<String> {
    if !CONTROL_TOKENS.iter().any(|t| text.contains(t)) {
        return None;
    }

    let mut cleaned = text.to_string();
    for token in CONTROL_TOKENS {
        cleaned = cleaned.replace(token, "");
    }
    Some(cleaned.trim().to_string())
}

/// Cut explanatory prose before the document start.
fn trim_leading_prose(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let start = lower.find("<!doctype").or_else(|| lower.find("<html"))?;
    if start == 0 {
        return None;
    }
    Some(text[start..].to_string())
}

/// Cut explanatory prose after the closing tag.
fn trim_trailing_prose(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let idx = lower.rfind("</html>")?;
    let end = idx + "</html>".len();
    if end == text.len() {
        return None;
    }
    Some(text[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "<!DOCTYPE html>\n<html><body><div id=\"root\"></div></body></html>";

    #[test]
    fn test_clean_document_untouched() {
        let sanitizer = ArtifactSanitizer::new();
        let (out, applied) = sanitizer.sanitize(DOC);
        assert_eq!(out, DOC);
        assert!(applied.is_empty());
    }

    #[test]
    fn test_fenced_document() {
        let sanitizer = ArtifactSanitizer::new();
        let raw = format!("```html\n{}\n```", DOC);
        let (out, applied) = sanitizer.sanitize(&raw);
        assert_eq!(out, DOC);
        assert_eq!(applied, vec!["strip_code_fence"]);
    }

    #[test]
    fn test_prose_before_and_after() {
        let sanitizer = ArtifactSanitizer::new();
        let raw = format!("Here is your website:\n\n{}\n\nLet me know what you think!", DOC);
        let (out, applied) = sanitizer.sanitize(&raw);
        assert_eq!(out, DOC);
        assert!(applied.contains(&"trim_leading_prose"));
        assert!(applied.contains(&"trim_trailing_prose"));
    }

    #[test]
    fn test_control_tokens_in_document() {
        let sanitizer = ArtifactSanitizer::new();
        let raw = format!("<|message|>{}<|im_end|>", DOC);
        let (out, _) = sanitizer.sanitize(&raw);
        assert_eq!(out, DOC);
    }

    #[test]
    fn test_rules_compose() {
        let sanitizer = ArtifactSanitizer::new();
        let raw = format!("Sure!\n```html\n{}\n```", DOC);
        let (out, applied) = sanitizer.sanitize(&raw);
        assert_eq!(out, DOC);
        assert!(applied.len() >= 1);
    }
}
