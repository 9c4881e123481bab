//! Pipeline Orchestrator
//!
//! Sequential state machine over the stage list. Each stage's prompt
//! builder may read any previously populated workspace slot, so stages
//! execute one at a time in dependency order - there is no parallel
//! fan-out, and the workspace is never touched by two stages at once.
//!
//! Per-stage states: Pending -> Running -> Done (always reached, degraded
//! or not). Pipeline-level: Reviewing -> optionally one bounded
//! Regenerating pass -> Complete. Nothing upstream of materialization can
//! fail the run: a degraded-but-present result always beats aborting a
//! multi-stage pipeline.

pub mod materialize;
pub mod reviewer;
pub mod runner;
pub mod stages;
pub mod workspace;

pub use materialize::{DiskMaterializer, Materializer};
pub use reviewer::{ConsistencyFinding, ConsistencyReviewer, RegenerationDecision, ReviewReport, Severity};
pub use runner::{OutputForm, PipelineStage, Prompt, StageContext, StageRunner};
pub use workspace::{ActionEntry, PipelineInput, StageId, ValidatedStageOutput, Workspace};

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::ai::SharedProvider;
use crate::config::Config;

use stages::{CodegenStage, ContentStage, DesignStage, IconsStage, LayoutStage, mood};

// =============================================================================
// States
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Pending,
    Running,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Generating,
    Reviewing,
    Regenerating,
    Complete,
}

// =============================================================================
// Outcome
// =============================================================================

/// Everything one run produces: the workspace (artifact included), the
/// final review, and the per-stage state map.
pub struct PipelineOutcome {
    pub workspace: Workspace,
    pub review: ReviewReport,
    pub stage_states: BTreeMap<StageId, StageState>,
    pub phase: PipelinePhase,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Owns the stage sequence and the shared workspace for one run at a time.
///
/// The provider is injected at construction; concurrent runs each call
/// `run` with their own input and get their own workspace - the only
/// shared state is the immutable schema/catalog tables.
pub struct PipelineOrchestrator {
    runner: StageRunner,
    reviewer: ConsistencyReviewer,
    regeneration_enabled: bool,
}

/// The generative stages, in dependency order. Mood runs first and is not
/// generative.
const GENERATIVE_STAGES: [&(dyn PipelineStage); 5] = [
    &DesignStage,
    &ContentStage,
    &LayoutStage,
    &IconsStage,
    &CodegenStage,
];

impl PipelineOrchestrator {
    pub fn new(provider: SharedProvider, config: &Config) -> Self {
        Self {
            runner: StageRunner::new(provider, config),
            reviewer: ConsistencyReviewer::new(),
            regeneration_enabled: config.pipeline.regeneration_enabled,
        }
    }

    /// Run the full pipeline. Infallible by design: every stage degrades
    /// to its fallback rather than aborting, so the caller always receives
    /// a complete workspace plus the audit trail of what degraded and why.
    pub async fn run(&self, input: &PipelineInput) -> PipelineOutcome {
        let mut workspace = Workspace::new();
        let mut states: BTreeMap<StageId, StageState> = StageId::ALL
            .iter()
            .map(|stage| (*stage, StageState::Pending))
            .collect();
        let mut phase = PipelinePhase::Generating;
        debug!("Pipeline phase: {:?}", phase);

        info!("Pipeline run {} started", workspace.run_id);
        workspace.record(format!("pipeline started for '{}'", input.user_name()));

        // Deterministic derivation first: no generative call, cannot fail
        states.insert(StageId::Mood, StageState::Running);
        let mood = mood::derive(input);
        workspace.record(format!(
            "mood derived: {}",
            mood.value
                .get("layout_style")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown")
        ));
        workspace.put(mood);
        states.insert(StageId::Mood, StageState::Done);

        for stage in GENERATIVE_STAGES {
            let stage_id = stage.id();
            states.insert(stage_id, StageState::Running);
            workspace.record(format!("{} running", stage_id));

            let report = {
                let ctx = StageContext {
                    input,
                    workspace: &workspace,
                    feedback: None,
                };
                self.runner.run(stage, &ctx).await
            };

            for note in &report.notes {
                workspace.record(note.clone());
            }
            workspace.record(format!(
                "{} done ({} attempt(s){})",
                stage_id,
                report.output.attempts,
                if report.output.degraded {
                    ", fallback"
                } else {
                    ""
                }
            ));
            workspace.put(report.output);
            states.insert(stage_id, StageState::Done);
        }

        // All stages Done: review the full workspace
        phase = PipelinePhase::Reviewing;
        debug!("Pipeline phase: {:?}", phase);
        workspace.record("reviewing workspace consistency");
        let mut review = self.reviewer.review(&workspace);
        workspace.record(format!("review: {}", review.summary()));

        if review.has_critical() {
            if self.regeneration_enabled {
                review = self
                    .regenerate_once(input, &mut workspace, &review, &mut phase)
                    .await;
            } else {
                workspace
                    .record("critical findings present; regeneration disabled by policy");
            }
        }

        phase = PipelinePhase::Complete;
        debug!("Pipeline phase: {:?}", phase);
        let degraded = workspace.degraded_stages();
        if !degraded.is_empty() {
            warn!(
                "Pipeline completed with degraded stages: {:?}",
                degraded.iter().map(StageId::as_str).collect::<Vec<_>>()
            );
        }
        workspace.record("pipeline complete");
        info!("Pipeline run {} complete", workspace.run_id);

        PipelineOutcome {
            workspace,
            review,
            stage_states: states,
            phase,
        }
    }

    /// One bounded regeneration pass: exactly one targeted stage re-runs
    /// with the reviewer's instruction appended to its prompt, then a
    /// re-review. Findings that survive are downgraded to logged warnings.
    async fn regenerate_once(
        &self,
        input: &PipelineInput,
        workspace: &mut Workspace,
        review: &ReviewReport,
        phase: &mut PipelinePhase,
    ) -> ReviewReport {
        let decision = self.reviewer.decide(review);
        let Some(target) = decision.target else {
            return review.clone();
        };

        let Some(stage) = GENERATIVE_STAGES
            .iter()
            .find(|stage| stage.id() == target)
        else {
            workspace.record(format!(
                "reviewer blamed non-regenerable stage '{}'; skipping regeneration",
                target
            ));
            return review.clone();
        };

        *phase = PipelinePhase::Regenerating;
        debug!("Pipeline phase: {:?}", phase);
        workspace.record(format!("regenerating {}: {}", target, decision.instruction));

        let report = {
            let ctx = StageContext {
                input,
                workspace,
                feedback: Some(&decision.instruction),
            };
            self.runner.run(*stage, &ctx).await
        };

        for note in &report.notes {
            workspace.record(note.clone());
        }
        workspace.put(report.output);

        *phase = PipelinePhase::Reviewing;
        debug!("Pipeline phase: {:?}", phase);
        workspace.record("re-reviewing after regeneration");
        let rereview = self.reviewer.review(workspace);
        workspace.record(format!("review: {}", rereview.summary()));

        if rereview.has_critical() {
            // Budget exhausted: one pass only, to avoid oscillation
            workspace.record(
                "critical findings persist after regeneration; downgraded to warnings",
            );
        }

        rereview
    }
}

// =============================================================================
// End-to-end tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{GenerationRequest, LlmProvider};
    use crate::types::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Stub provider scripted per-request from the prompt text
    struct ScriptedProvider<F>
    where
        F: Fn(&GenerationRequest<'_>) -> String + Send + Sync,
    {
        script: F,
        calls: AtomicU32,
    }

    impl<F> ScriptedProvider<F>
    where
        F: Fn(&GenerationRequest<'_>) -> String + Send + Sync,
    {
        fn shared(script: F) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl<F> LlmProvider for ScriptedProvider<F>
    where
        F: Fn(&GenerationRequest<'_>) -> String + Send + Sync,
    {
        async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((self.script)(request))
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn scenario_input() -> PipelineInput {
        let mut answers = BTreeMap::new();
        answers.insert("who_are_you".to_string(), "Jordan".to_string());
        let mut vibe = BTreeMap::new();
        vibe.insert("favorite_color".to_string(), "blue".to_string());
        vibe.insert("animal".to_string(), "wolf".to_string());
        vibe.insert("abstract_word".to_string(), "flow".to_string());

        PipelineInput {
            raw_text: "I shipped a rewrite, it broke prod, I learned to stage rollouts."
                .to_string(),
            answers,
            vibe,
            media_files: vec![],
        }
    }

    fn valid_design() -> String {
        json!({
            "archetype": "case_study",
            "layout": "terminal_console",
            "motion": "typewriter_reveal",
            "theme": "cyberpunk_neon",
            "color_palette": ["#0071e3", "#1d1d1f", "#2997ff", "#000000", "#f5f5f7"],
            "typography_pair": {"heading": "JetBrains Mono, monospace", "body": "IBM Plex Mono, monospace"},
            "reasoning": "backend energy"
        })
        .to_string()
    }

    fn valid_content() -> String {
        json!({
            "pages": {
                "home": {
                    "thesis": "I learned to stage rollouts",
                    "introduction": ["I shipped a rewrite, it broke prod."],
                    "navigation_prompt": "Explore"
                },
                "behavioral_patterns": {
                    "page_title": "Patterns",
                    "introduction": [],
                    "patterns": [{
                        "name": "Staged rollouts",
                        "summary": "Hard-won deployment discipline",
                        "analysis": ["After the rewrite broke prod, I never ship big-bang again."]
                    }]
                },
                "about": {"page_title": "About", "introduction": ["Get in touch."]}
            },
            "meta": {
                "site_title": "Jordan",
                "navigation_structure": ["Home", "Patterns", "About"]
            }
        })
        .to_string()
    }

    fn valid_layout() -> String {
        json!({
            "navigation": {
                "type": "fixed-top-nav",
                "structure": ["Home", "Patterns", "About"],
                "style": "Fixed header"
            },
            "pages": [],
            "typography_system": {"custom_fonts": "JetBrains Mono", "font_scale": "Standard"},
            "animation_strategy": {"style": "Typewriter"}
        })
        .to_string()
    }

    fn valid_icons() -> String {
        json!({
            "icon_library": "lucide",
            "cdn_url": "https://unpkg.com/lucide@latest/dist/umd/lucide.min.js",
            "color_scheme": "accent",
            "suggestions": [
                {"location": "navigation-home", "icon_name": "home", "purpose": "Home"}
            ],
            "usage_philosophy": "minimal"
        })
        .to_string()
    }

    /// Route a request to a canned response by prompt markers
    fn respond_by_stage(request: &GenerationRequest<'_>, codegen_response: &str) -> String {
        let user = request.user_prompt;
        if user.contains("USER INTERVIEW ANSWERS") {
            valid_content()
        } else if user.contains("VIBE CHECK") {
            valid_design()
        } else if user.contains("Design UX for") {
            valid_layout()
        } else if user.contains("Curate icons for") {
            valid_icons()
        } else if user.contains("Generate the site for") {
            codegen_response.to_string()
        } else {
            "unexpected prompt".to_string()
        }
    }

    #[tokio::test]
    async fn test_scenario_a_artifact_carries_user_data() {
        // Codegen output is garbage, so the artifact is the deterministic
        // template rendered from the (valid) upstream stage outputs.
        let provider =
            ScriptedProvider::shared(|req| respond_by_stage(req, "sorry, no HTML today"));
        let orchestrator = PipelineOrchestrator::new(provider, &Config::default());

        let outcome = orchestrator.run(&scenario_input()).await;

        assert_eq!(outcome.phase, PipelinePhase::Complete);
        let artifact = outcome.workspace.artifact_html().expect("artifact present");
        assert!(artifact.contains("Jordan"));
        assert!(artifact.contains("Staged rollouts"));
        assert!(!outcome.review.has_critical(), "{}", outcome.review.summary());
        assert!(
            outcome
                .stage_states
                .values()
                .all(|state| *state == StageState::Done)
        );
    }

    #[tokio::test]
    async fn test_scenario_b_garbage_degrades_everything_but_completes() {
        let provider = ScriptedProvider::shared(|_| "not json at all".to_string());
        let config = Config::default();
        let orchestrator = PipelineOrchestrator::new(provider.clone(), &config);

        let outcome = orchestrator.run(&scenario_input()).await;

        assert_eq!(outcome.phase, PipelinePhase::Complete);

        // Every LLM-driven stage fell back to its static default
        let degraded = outcome.workspace.degraded_stages();
        for stage in [
            StageId::Design,
            StageId::Content,
            StageId::Layout,
            StageId::Icons,
            StageId::Codegen,
        ] {
            assert!(degraded.contains(&stage), "{} not degraded", stage);
        }
        assert!(!degraded.contains(&StageId::Mood));

        // The artifact is the non-empty fallback document, not an error
        let artifact = outcome.workspace.artifact_html().expect("artifact present");
        assert!(artifact.contains("<html"));
        assert!(artifact.contains("CONTENT_DATA"));

        // 5 generative stages x max_attempts calls, no more
        assert_eq!(
            provider.calls.load(Ordering::SeqCst),
            5 * config.pipeline.max_attempts
        );
    }

    #[tokio::test]
    async fn test_scenario_c_mood_identical_across_runs() {
        let provider = ScriptedProvider::shared(|_| "not json at all".to_string());
        let orchestrator = PipelineOrchestrator::new(provider, &Config::default());

        let first = orchestrator.run(&scenario_input()).await;
        let second = orchestrator.run(&scenario_input()).await;

        let mood_a = first.workspace.value(StageId::Mood).unwrap();
        let mood_b = second.workspace.value(StageId::Mood).unwrap();
        assert_eq!(
            serde_json::to_string(mood_a).unwrap(),
            serde_json::to_string(mood_b).unwrap()
        );
    }

    #[tokio::test]
    async fn test_regeneration_disabled_by_default_despite_criticals() {
        // Valid upstream stages, artifact missing every CDN script
        let bare_artifact = "<html><div id=\"root\"></div>\
             <script type=\"text/babel\">const CONTENT_DATA = {};</script></html>";
        let provider = ScriptedProvider::shared(move |req| respond_by_stage(req, bare_artifact));
        let orchestrator = PipelineOrchestrator::new(provider.clone(), &Config::default());

        let outcome = orchestrator.run(&scenario_input()).await;

        assert!(outcome.review.has_critical());
        // 5 stages, one attempt each - no regeneration call happened
        assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
        assert!(
            outcome
                .workspace
                .action_log()
                .iter()
                .any(|entry| entry.note.contains("regeneration disabled by policy"))
        );
    }

    #[tokio::test]
    async fn test_bounded_regeneration_fixes_artifact() {
        let bare_artifact = "<html><div id=\"root\"></div>\
             <script type=\"text/babel\">const CONTENT_DATA = {};</script></html>";
        let full_artifact = format!(
            "<html><div id=\"root\"></div>\
             <script src=\"{}\"></script><script src=\"{}\"></script><script src=\"{}\"></script>\
             <script type=\"text/babel\">const CONTENT_DATA = {{}};</script></html>",
            crate::constants::cdn::REACT,
            crate::constants::cdn::REACT_DOM,
            crate::constants::cdn::BABEL_STANDALONE,
        );

        let provider = ScriptedProvider::shared(move |req| {
            if req.user_prompt.contains("REVIEWER FEEDBACK") {
                full_artifact.clone()
            } else {
                respond_by_stage(req, bare_artifact)
            }
        });

        let mut config = Config::default();
        config.pipeline.regeneration_enabled = true;
        let orchestrator = PipelineOrchestrator::new(provider.clone(), &config);

        let outcome = orchestrator.run(&scenario_input()).await;

        assert!(!outcome.review.has_critical(), "{}", outcome.review.summary());
        // 5 first-pass calls + exactly 1 regeneration call
        assert_eq!(provider.calls.load(Ordering::SeqCst), 6);
        assert!(
            outcome
                .workspace
                .action_log()
                .iter()
                .any(|entry| entry.note.contains("regenerating codegen"))
        );
    }

    #[tokio::test]
    async fn test_action_log_grows_monotonically() {
        let provider = ScriptedProvider::shared(|_| "not json at all".to_string());
        let orchestrator = PipelineOrchestrator::new(provider, &Config::default());

        let outcome = orchestrator.run(&scenario_input()).await;

        let log = outcome.workspace.action_log();
        assert!(log.len() > 10);
        for window in log.windows(2) {
            assert!(window[0].version < window[1].version);
        }
        assert_eq!(log.last().unwrap().note, "pipeline complete");
    }
}
