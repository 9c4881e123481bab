//! Pipeline Workspace
//!
//! The shared state threading through one end-to-end run: one validated
//! output slot per stage plus a monotonically growing action log.
//!
//! Invariants:
//! - the set of populated slots only grows; a stage is never un-set
//!   (a re-run replaces its output wholesale, never mutates it in place)
//! - the action log is append-only and versioned
//!
//! Each run owns its own workspace; nothing here is shared across
//! concurrent runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::constants::prompt;
use crate::types::truncate_chars;

// =============================================================================
// Stage Identity
// =============================================================================

/// One step of the pipeline, in dependency order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Deterministic mood derivation from vibe inputs
    Mood,
    /// Design DNA (archetype, layout, motion, theme, palette, typography)
    Design,
    /// Content strategy (pages + site meta)
    Content,
    /// UX plan (navigation, page layouts, typography system)
    Layout,
    /// Icon strategy
    Icons,
    /// Website source artifact
    Codegen,
}

impl StageId {
    /// All stages in execution order
    pub const ALL: [StageId; 6] = [
        StageId::Mood,
        StageId::Design,
        StageId::Content,
        StageId::Layout,
        StageId::Icons,
        StageId::Codegen,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mood => "mood",
            Self::Design => "design",
            Self::Content => "content",
            Self::Layout => "layout",
            Self::Icons => "icons",
            Self::Codegen => "codegen",
        }
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Pipeline Input
// =============================================================================

/// Everything one run consumes. Text extraction from documents/URLs
/// happens upstream; by the time input reaches the pipeline it is plain
/// text plus small string maps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineInput {
    /// Raw free text already extracted from the user's sources
    pub raw_text: String,
    /// Questionnaire answers (short string values)
    pub answers: BTreeMap<String, String>,
    /// The three vibe inputs consumed by the mood derivation
    pub vibe: BTreeMap<String, String>,
    /// Uploaded media files, copied verbatim by the materializer
    pub media_files: Vec<PathBuf>,
}

impl PipelineInput {
    /// Display name taken from the questionnaire, bounded in length
    pub fn user_name(&self) -> &str {
        self.answers
            .get("who_are_you")
            .map(|name| truncate_chars(name, prompt::MAX_USER_NAME_CHARS))
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("Professional")
    }
}

// =============================================================================
// Validated Stage Output
// =============================================================================

/// A recovered value that passed (possibly auto-corrected) schema
/// validation, or a stage's static fallback. Owned by the workspace;
/// replaced wholesale on a re-run, never partially mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedStageOutput {
    pub stage: StageId,
    pub value: Value,
    /// True when the retry budget was exhausted and this is the fallback
    pub degraded: bool,
    /// Generative attempts consumed (0 for the deterministic stage)
    pub attempts: u32,
}

// =============================================================================
// Action Log
// =============================================================================

/// One appended note in the run's audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEntry {
    pub version: u32,
    pub at: DateTime<Utc>,
    pub note: String,
}

impl std::fmt::Display for ActionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}: {}", self.version, self.note)
    }
}

// =============================================================================
// Workspace
// =============================================================================

/// Shared mutable state for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub run_id: uuid::Uuid,
    pub started_at: DateTime<Utc>,
    slots: BTreeMap<StageId, ValidatedStageOutput>,
    version: u32,
    action_log: Vec<ActionEntry>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4(),
            started_at: Utc::now(),
            slots: BTreeMap::new(),
            version: 0,
            action_log: Vec::new(),
        }
    }

    /// Append a note to the action log, bumping the workspace version
    pub fn record(&mut self, note: impl Into<String>) {
        self.version += 1;
        self.action_log.push(ActionEntry {
            version: self.version,
            at: Utc::now(),
            note: note.into(),
        });
    }

    /// Install a stage output, replacing any previous output wholesale
    pub fn put(&mut self, output: ValidatedStageOutput) {
        self.slots.insert(output.stage, output);
    }

    pub fn get(&self, stage: StageId) -> Option<&ValidatedStageOutput> {
        self.slots.get(&stage)
    }

    /// Stage value, if the stage has run
    pub fn value(&self, stage: StageId) -> Option<&Value> {
        self.slots.get(&stage).map(|out| &out.value)
    }

    /// The emitted website source, once the code stage has run
    pub fn artifact_html(&self) -> Option<&str> {
        self.value(StageId::Codegen).and_then(Value::as_str)
    }

    pub fn action_log(&self) -> &[ActionEntry] {
        &self.action_log
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Stages that exhausted their retry budget and run on fallbacks
    pub fn degraded_stages(&self) -> Vec<StageId> {
        self.slots
            .values()
            .filter(|out| out.degraded)
            .map(|out| out.stage)
            .collect()
    }

    /// Structured run data for the materializer's data file: every stage
    /// value plus the audit trail.
    pub fn structured_data(&self) -> Value {
        json!({
            "run_id": self.run_id,
            "started_at": self.started_at,
            "mood_system": self.value(StageId::Mood),
            "design_dna": self.value(StageId::Design),
            "content_strategy": self.value(StageId::Content),
            "ux_plan": self.value(StageId::Layout),
            "icon_plan": self.value(StageId::Icons),
            "degraded_stages": self.degraded_stages(),
            "action_log": self.action_log,
        })
    }
}
