//! Output Recovery Engine
//!
//! Extracts a structured value from unreliable free-text model output.
//!
//! Handles common LLM JSON output issues:
//! - Markdown code fence wrapping (```json ... ```)
//! - Chat-turn delimiters and channel markers
//! - JSON embedded in explanatory prose
//! - Trailing commas before closing braces/brackets
//!
//! Strategies run in a fixed order of decreasing confidence and increasing
//! invasiveness: cheap, exact strategies first; textual surgery last. Each
//! strategy returns `Option` - there is no exception-driven control flow
//! for expected-to-fail paths. Only exhaustion of every strategy is an
//! error.

use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::CONTROL_TOKENS;
use crate::types::{PlatoError, Result};

/// A value the engine managed to extract, tagged with the strategy that
/// produced it.
#[derive(Debug, Clone)]
pub struct Recovered {
    /// Syntactically valid structured data (not yet schema-valid)
    pub value: Value,
    /// Name of the strategy that succeeded, for the action log
    pub strategy: &'static str,
}

/// Ordered-strategy JSON extractor for raw model output
pub struct RecoveryEngine {
    object_pattern: regex::Regex,
    trailing_comma: regex::Regex,
}

impl Default for RecoveryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryEngine {
    pub fn new() -> Self {
        Self {
            // Brace-delimited substrings, one level of nesting, non-greedy
            object_pattern: regex::Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}")
                .expect("static pattern compiles"),
            trailing_comma: regex::Regex::new(r",\s*([}\]])").expect("static pattern compiles"),
        }
    }

    /// Extract a structured value from raw model output.
    ///
    /// Fails only when every strategy is exhausted.
    pub fn recover(&self, raw: &str) -> Result<Recovered> {
        if raw.trim().is_empty() {
            return Err(PlatoError::recovery(raw));
        }

        let attempts: [(&'static str, Option<Value>); 6] = [
            ("direct", self.parse_direct(raw)),
            ("strip_fence", self.parse_fenced(raw)),
            ("strip_control_tokens", self.parse_without_markers(raw)),
            ("balanced_braces", self.parse_balanced_object(raw)),
            ("regex_object_scan", self.parse_regex_candidates(raw)),
            ("repair_trailing_commas", self.parse_repaired(raw)),
        ];

        for (strategy, value) in attempts {
            if let Some(value) = value {
                if strategy != "direct" {
                    debug!("Recovered model output via strategy '{}'", strategy);
                }
                return Ok(Recovered { value, strategy });
            }
        }

        warn!(
            "All recovery strategies exhausted ({} chars of output)",
            raw.len()
        );
        Err(PlatoError::recovery(raw))
    }

    // =========================================================================
    // Strategies
    // =========================================================================

    /// Strategy 1: the output is already valid JSON.
    fn parse_direct(&self, raw: &str) -> Option<Value> {
        serde_json::from_str(raw.trim()).ok()
    }

    /// Strategy 2: strip a single wrapping code fence and parse the interior.
    fn parse_fenced(&self, raw: &str) -> Option<Value> {
        let stripped = strip_code_fence(raw)?;
        serde_json::from_str(stripped.trim()).ok()
    }

    /// Strategy 3: remove known chat/control markers, then re-parse.
    fn parse_without_markers(&self, raw: &str) -> Option<Value> {
        let cleaned = self.precleaned(raw);
        serde_json::from_str(cleaned.trim()).ok()
    }

    /// Strategy 4: scan from the first `{` tracking nesting depth to the
    /// balanced closing brace, and parse that substring.
    fn parse_balanced_object(&self, raw: &str) -> Option<Value> {
        let cleaned = self.precleaned(raw);
        let candidate = balanced_object_span(&cleaned)?;
        serde_json::from_str(candidate).ok()
    }

    /// Strategy 5: regex-scan for brace-delimited substrings and parse the
    /// first one that yields a non-empty mapping.
    fn parse_regex_candidates(&self, raw: &str) -> Option<Value> {
        let cleaned = self.precleaned(raw);
        for m in self.object_pattern.find_iter(&cleaned) {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(m.as_str())
                && !map.is_empty()
            {
                return Some(Value::Object(map));
            }
        }
        None
    }

    /// Strategy 6: textual repair of the best candidate substring. Removes
    /// trailing commas before closing braces/brackets. May touch string
    /// contents - last resort only.
    fn parse_repaired(&self, raw: &str) -> Option<Value> {
        let cleaned = self.precleaned(raw);
        let candidate = balanced_object_span(&cleaned).unwrap_or(&cleaned);
        let repaired = self.trailing_comma.replace_all(candidate, "$1");
        serde_json::from_str(&repaired).ok()
    }

    /// Shared pre-clean for the invasive strategies: fence stripped (when
    /// present) and control tokens removed.
    fn precleaned(&self, raw: &str) -> String {
        let defenced = strip_code_fence(raw).unwrap_or_else(|| raw.to_string());
        let mut cleaned = defenced;
        for token in CONTROL_TOKENS {
            if cleaned.contains(token) {
                cleaned = cleaned.replace(token, "");
            }
        }
        cleaned.trim().to_string()
    }
}

// =============================================================================
// Text helpers
// =============================================================================

/// Strip one leading/trailing fenced block, optionally language-tagged.
/// Returns `None` when the input carries no fence.
fn strip_code_fence(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return None;
    }

    let after_open = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        // Opening fence with no newline: ```{"a":1}```
        None => trimmed.trim_start_matches('`'),
    };

    let interior = after_open
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(after_open);

    Some(interior.trim().to_string())
}

/// Locate the first `{` and scan forward, tracking brace nesting and JSON
/// string/escape state, to the matching closing brace.
fn balanced_object_span(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, ch) in s[start..].char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
