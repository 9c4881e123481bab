//! Stage Runner
//!
//! Wraps one generative pipeline stage: builds the prompt from upstream
//! data, invokes the generative call at a temperature that rises with each
//! retry, runs the result through recovery (or artifact sanitation),
//! applies stage-specific structural auto-correction, validates, and on
//! exhaustion of the retry budget substitutes the stage's static fallback.
//!
//! No error ever escapes `run`: the pipeline always obtains *some*
//! validated output per stage, degraded or not.

use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::ai::{ArtifactSanitizer, GenerationRequest, RecoveryEngine, SharedProvider, with_timeout};
use crate::config::{Config, PipelineConfig};
use crate::schema::StageSchema;
use crate::types::{Result, SchemaError};

use super::workspace::{PipelineInput, StageId, ValidatedStageOutput, Workspace};

// =============================================================================
// Stage Abstraction
// =============================================================================

/// How a stage's raw model output is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputForm {
    /// JSON: recovery engine, auto-correction, schema validation
    Structured,
    /// Code text: artifact sanitizer, document validation
    Document,
}

/// System/user prompt pair for one generative call
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Read-only view a stage builds its prompt from
pub struct StageContext<'a> {
    pub input: &'a PipelineInput,
    pub workspace: &'a Workspace,
    /// Reviewer instruction, present only during a regeneration re-run
    pub feedback: Option<&'a str>,
}

/// One generative pipeline stage.
///
/// Implementations provide the declarative pieces; the runner owns the
/// retry/fallback machinery.
pub trait PipelineStage: Send + Sync {
    fn id(&self) -> StageId;

    /// Expected output shape. Unused for `Document` stages.
    fn schema(&self) -> StageSchema;

    fn output_form(&self) -> OutputForm {
        OutputForm::Structured
    }

    fn build_prompt(&self, ctx: &StageContext<'_>) -> Prompt;

    /// Structural auto-correction applied between recovery and schema
    /// validation. Re-wraps content the model returned at the wrong
    /// nesting level so usable output is not discarded at validation.
    fn autocorrect(&self, value: Value, _ctx: &StageContext<'_>) -> Value {
        value
    }

    /// Boilerplate validation for `Document` stages
    fn validate_document(&self, _text: &str) -> std::result::Result<(), SchemaError> {
        Ok(())
    }

    /// Statically declared, always-valid minimal output
    fn fallback(&self, ctx: &StageContext<'_>) -> Value;
}

// =============================================================================
// Runner
// =============================================================================

/// Outcome of one stage run, with notes destined for the action log
pub struct StageReport {
    pub output: ValidatedStageOutput,
    pub notes: Vec<String>,
}

/// Generic retry/fallback executor shared by every generative stage
pub struct StageRunner {
    provider: SharedProvider,
    policy: PipelineConfig,
    call_timeout: Duration,
    max_output_tokens: usize,
    recovery: RecoveryEngine,
    sanitizer: ArtifactSanitizer,
}

impl StageRunner {
    pub fn new(provider: SharedProvider, config: &Config) -> Self {
        Self {
            provider,
            policy: config.pipeline.clone(),
            call_timeout: Duration::from_secs(config.llm.timeout_secs),
            max_output_tokens: config.llm.max_output_tokens,
            recovery: RecoveryEngine::new(),
            sanitizer: ArtifactSanitizer::new(),
        }
    }

    /// Run one stage to a validated output. Infallible by design: after
    /// `max_attempts` failures the stage's fallback is substituted.
    pub async fn run(&self, stage: &dyn PipelineStage, ctx: &StageContext<'_>) -> StageReport {
        let stage_id = stage.id();
        let prompt = stage.build_prompt(ctx);
        let mut notes = Vec::new();

        for attempt in 0..self.policy.max_attempts {
            let temperature = self.policy.temperature_for_attempt(attempt);
            debug!(
                "Stage '{}' attempt {}/{} (temperature {:.2})",
                stage_id,
                attempt + 1,
                self.policy.max_attempts,
                temperature
            );

            match self.attempt(stage, &prompt, temperature, ctx).await {
                Ok(value) => {
                    if attempt > 0 {
                        notes.push(format!(
                            "{} succeeded on attempt {}",
                            stage_id,
                            attempt + 1
                        ));
                    }
                    return StageReport {
                        output: ValidatedStageOutput {
                            stage: stage_id,
                            value,
                            degraded: false,
                            attempts: attempt + 1,
                        },
                        notes,
                    };
                }
                Err(e) => {
                    warn!("Stage '{}' attempt {} failed: {}", stage_id, attempt + 1, e);
                    notes.push(format!("{} attempt {} failed: {}", stage_id, attempt + 1, e));
                }
            }
        }

        warn!(
            "Stage '{}' retry budget exhausted after {} attempts, using fallback",
            stage_id, self.policy.max_attempts
        );
        notes.push(format!(
            "{} retry budget exhausted, substituted static fallback",
            stage_id
        ));

        StageReport {
            output: ValidatedStageOutput {
                stage: stage_id,
                value: stage.fallback(ctx),
                degraded: true,
                attempts: self.policy.max_attempts,
            },
            notes,
        }
    }

    /// One generative attempt through the full repair/validation chain
    async fn attempt(
        &self,
        stage: &dyn PipelineStage,
        prompt: &Prompt,
        temperature: f32,
        ctx: &StageContext<'_>,
    ) -> Result<Value> {
        let request = GenerationRequest {
            system_prompt: &prompt.system,
            user_prompt: &prompt.user,
            temperature,
            max_output_tokens: self.max_output_tokens,
        };

        let operation = format!("{} generation", stage.id());
        let raw = with_timeout(
            self.call_timeout,
            self.provider.generate(&request),
            &operation,
        )
        .await?;

        match stage.output_form() {
            OutputForm::Structured => {
                let recovered = self.recovery.recover(&raw)?;
                let corrected = stage.autocorrect(recovered.value, ctx);
                let validated = stage.schema().validate(&corrected)?;
                Ok(validated)
            }
            OutputForm::Document => {
                let (text, applied) = self.sanitizer.sanitize(&raw);
                if !applied.is_empty() {
                    debug!(
                        "Stage '{}' artifact sanitized: {}",
                        stage.id(),
                        applied.join(", ")
                    );
                }
                stage.validate_document(&text)?;
                Ok(Value::String(text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::LlmProvider;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Stub provider that always returns the same canned text
    struct CannedProvider {
        response: String,
        calls: AtomicU32,
    }

    impl CannedProvider {
        fn shared(response: &str) -> Arc<Self> {
            Arc::new(Self {
                response: response.to_string(),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn generate(&self, _request: &GenerationRequest<'_>) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }

        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    struct EchoStage;

    impl PipelineStage for EchoStage {
        fn id(&self) -> StageId {
            StageId::Content
        }

        fn schema(&self) -> StageSchema {
            use crate::schema::{FieldKind, FieldSpec};
            StageSchema::new(
                "echo",
                vec![FieldSpec::required("message", FieldKind::String)],
            )
        }

        fn build_prompt(&self, _ctx: &StageContext<'_>) -> Prompt {
            Prompt {
                system: "system".to_string(),
                user: "user".to_string(),
            }
        }

        fn fallback(&self, _ctx: &StageContext<'_>) -> Value {
            json!({"message": "fallback"})
        }
    }

    fn test_config(max_attempts: u32) -> Config {
        let mut config = Config::default();
        config.pipeline.max_attempts = max_attempts;
        config
    }

    fn test_ctx<'a>(input: &'a PipelineInput, workspace: &'a Workspace) -> StageContext<'a> {
        StageContext {
            input,
            workspace,
            feedback: None,
        }
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let provider = CannedProvider::shared(r#"{"message": "hi"}"#);
        let runner = StageRunner::new(provider.clone(), &test_config(3));
        let input = PipelineInput::default();
        let workspace = Workspace::new();

        let report = runner.run(&EchoStage, &test_ctx(&input, &workspace)).await;

        assert!(!report.output.degraded);
        assert_eq!(report.output.attempts, 1);
        assert_eq!(report.output.value["message"], "hi");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fenced_output_recovered() {
        let provider = CannedProvider::shared("```json\n{\"message\": \"hi\"}\n```");
        let runner = StageRunner::new(provider, &test_config(3));
        let input = PipelineInput::default();
        let workspace = Workspace::new();

        let report = runner.run(&EchoStage, &test_ctx(&input, &workspace)).await;
        assert!(!report.output.degraded);
        assert_eq!(report.output.value["message"], "hi");
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_counts_calls_exactly() {
        let provider = CannedProvider::shared("total garbage, not json");
        let runner = StageRunner::new(provider.clone(), &test_config(4));
        let input = PipelineInput::default();
        let workspace = Workspace::new();

        let report = runner.run(&EchoStage, &test_ctx(&input, &workspace)).await;

        // Exactly max_attempts generative calls - no more, no fewer -
        // then the declared fallback.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
        assert!(report.output.degraded);
        assert_eq!(report.output.attempts, 4);
        assert_eq!(report.output.value, json!({"message": "fallback"}));
    }

    #[tokio::test]
    async fn test_schema_failure_triggers_retry() {
        // Valid JSON but missing the required field: recovery succeeds,
        // validation fails, every attempt is consumed.
        let provider = CannedProvider::shared(r#"{"wrong_field": true}"#);
        let runner = StageRunner::new(provider.clone(), &test_config(2));
        let input = PipelineInput::default();
        let workspace = Workspace::new();

        let report = runner.run(&EchoStage, &test_ctx(&input, &workspace)).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert!(report.output.degraded);
    }
}
