//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//!
//! ## Design Principles
//!
//! - Single unified error type (PlatoError) for the entire application
//! - Recovery and schema failures stay local to one stage attempt; the
//!   stage runner absorbs them into its retry/fallback policy
//! - Materialization is the only error class that terminates a run
//! - No panic/unwrap - all errors are recoverable

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Schema Error
// =============================================================================

/// Structural validation failure with field context
#[derive(Debug, Clone)]
pub struct SchemaError {
    /// Dotted path of the field that failed (e.g. `pages.home.thesis`)
    pub field: Option<String>,
    /// Detailed message
    pub message: String,
    /// Expected type or shape
    pub expected: Option<String>,
    /// Actual value kind received
    pub actual: Option<String>,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.field, &self.expected, &self.actual) {
            (Some(field), Some(expected), Some(actual)) => write!(
                f,
                "Schema validation failed for '{}': {} (expected {}, got {})",
                field, self.message, expected, actual
            ),
            (Some(field), _, _) => {
                write!(f, "Schema validation failed for '{}': {}", field, self.message)
            }
            _ => write!(f, "Schema validation failed: {}", self.message),
        }
    }
}

impl std::error::Error for SchemaError {}

impl SchemaError {
    /// Create a new schema error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    /// Add field path context
    pub fn at(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add expected/actual kinds
    pub fn with_comparison(
        mut self,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum PlatoError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Stage-Attempt Errors (absorbed by the stage runner)
    // -------------------------------------------------------------------------
    /// No structured value could be extracted from model output
    #[error("No structured value recovered from model output. Preview: {preview}")]
    Recovery { preview: String },

    /// Recovered value failed required-field validation after auto-correction
    #[error("{0}")]
    Schema(SchemaError),

    /// Generative call failed at the transport/API level
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// Operation exceeded its deadline
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    // -------------------------------------------------------------------------
    // Run-Level Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    /// The only error class that terminates a pipeline run with a failure
    #[error("Materialization failed: {0}")]
    Materialize(String),
}

impl From<SchemaError> for PlatoError {
    fn from(err: SchemaError) -> Self {
        PlatoError::Schema(err)
    }
}

pub type Result<T> = std::result::Result<T, PlatoError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl PlatoError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a recovery error with a bounded preview of the raw output
    pub fn recovery(raw: &str) -> Self {
        Self::Recovery {
            preview: raw.chars().take(200).collect(),
        }
    }

    /// Whether this failure is local to one stage attempt (triggers the
    /// next retry rather than aborting the stage)
    pub fn is_attempt_local(&self) -> bool {
        matches!(
            self,
            Self::Recovery { .. } | Self::Schema(_) | Self::LlmApi(_) | Self::Timeout { .. }
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::new("missing required field")
            .at("pages.home")
            .with_comparison("object", "string");
        assert_eq!(
            err.to_string(),
            "Schema validation failed for 'pages.home': missing required field (expected object, got string)"
        );
    }

    #[test]
    fn test_recovery_preview_bounded() {
        let raw = "x".repeat(1000);
        let err = PlatoError::recovery(&raw);
        if let PlatoError::Recovery { preview } = err {
            assert_eq!(preview.chars().count(), 200);
        } else {
            panic!("expected recovery error");
        }
    }

    #[test]
    fn test_attempt_local_classification() {
        assert!(PlatoError::recovery("garbage").is_attempt_local());
        assert!(PlatoError::Schema(SchemaError::new("bad")).is_attempt_local());
        assert!(PlatoError::LlmApi("boom".into()).is_attempt_local());
        assert!(!PlatoError::Materialize("disk full".into()).is_attempt_local());
        assert!(!PlatoError::Config("bad".into()).is_attempt_local());
    }
}
