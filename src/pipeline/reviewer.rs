//! Consistency Reviewer
//!
//! Cross-checks the populated workspace after generation: navigation vs.
//! produced content sections, required boilerplate in the emitted
//! artifact, mount-point ordering. Every check is decidable from the
//! workspace alone - no generative call.
//!
//! Findings carry a severity. Only critical findings can trigger the one
//! bounded regeneration; stylistic findings are recorded and nothing
//! more. The asymmetry is intentional: regeneration is expensive and
//! occasionally produces a worse artifact, so the bar is high.

use serde_json::Value;

use crate::constants::cdn;

use super::workspace::{StageId, Workspace};

// =============================================================================
// Findings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// May trigger regeneration (when enabled by policy)
    Critical,
    /// Recorded in the log, never triggers regeneration
    Advisory,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "CRITICAL"),
            Self::Advisory => write!(f, "ADVISORY"),
        }
    }
}

/// One cross-check result, attributed to the stage that should fix it
#[derive(Debug, Clone)]
pub struct ConsistencyFinding {
    pub owner: StageId,
    pub severity: Severity,
    pub message: String,
}

impl ConsistencyFinding {
    fn critical(owner: StageId, message: impl Into<String>) -> Self {
        Self {
            owner,
            severity: Severity::Critical,
            message: message.into(),
        }
    }

    fn advisory(owner: StageId, message: impl Into<String>) -> Self {
        Self {
            owner,
            severity: Severity::Advisory,
            message: message.into(),
        }
    }
}

/// All findings from one reviewer pass
#[derive(Debug, Clone, Default)]
pub struct ReviewReport {
    pub findings: Vec<ConsistencyFinding>,
}

impl ReviewReport {
    pub fn has_critical(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.severity == Severity::Critical)
    }

    pub fn critical_findings(&self) -> impl Iterator<Item = &ConsistencyFinding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
    }

    /// Human-readable one-line-per-finding summary for the action log
    pub fn summary(&self) -> String {
        if self.findings.is_empty() {
            return "no findings".to_string();
        }
        self.findings
            .iter()
            .map(|f| format!("[{}] {}: {}", f.severity, f.owner, f.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Whether and what to regenerate, consumed by the orchestrator
#[derive(Debug, Clone)]
pub struct RegenerationDecision {
    pub regenerate: bool,
    /// Exactly one targeted stage - the one the reviewer blames
    pub target: Option<StageId>,
    /// Free-text instruction appended to the re-run prompt
    pub instruction: String,
}

impl RegenerationDecision {
    pub fn none() -> Self {
        Self {
            regenerate: false,
            target: None,
            instruction: String::new(),
        }
    }
}

// =============================================================================
// Reviewer
// =============================================================================

#[derive(Debug, Default)]
pub struct ConsistencyReviewer;

impl ConsistencyReviewer {
    pub fn new() -> Self {
        Self
    }

    /// Inspect the full workspace and collect findings
    pub fn review(&self, workspace: &Workspace) -> ReviewReport {
        let mut findings = Vec::new();

        self.check_navigation(workspace, &mut findings);
        self.check_icons(workspace, &mut findings);
        self.check_artifact(workspace, &mut findings);

        ReviewReport { findings }
    }

    /// Turn a report into at most one targeted regeneration
    pub fn decide(&self, report: &ReviewReport) -> RegenerationDecision {
        let Some(first_critical) = report.critical_findings().next() else {
            return RegenerationDecision::none();
        };

        // All critical findings owned by the blamed stage go into the
        // instruction; findings against other stages wait for the next run.
        let target = first_critical.owner;
        let instruction = report
            .critical_findings()
            .filter(|f| f.owner == target)
            .map(|f| f.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");

        RegenerationDecision {
            regenerate: true,
            target: Some(target),
            instruction,
        }
    }

    // =========================================================================
    // Checks
    // =========================================================================

    /// Declared navigation entries vs. actual content sections
    fn check_navigation(&self, workspace: &Workspace, findings: &mut Vec<ConsistencyFinding>) {
        let Some(pages) = workspace
            .value(StageId::Content)
            .and_then(|content| content.get("pages"))
            .and_then(Value::as_object)
        else {
            return;
        };

        let Some(nav) = workspace
            .value(StageId::Layout)
            .and_then(|layout| layout.pointer("/navigation/structure"))
            .and_then(Value::as_array)
        else {
            return;
        };

        let nav_entries: Vec<String> = nav
            .iter()
            .filter_map(Value::as_str)
            .map(normalize)
            .collect();

        for page_key in pages.keys() {
            let normalized = normalize(page_key);
            let covered = nav_entries
                .iter()
                .any(|entry| entry == &normalized || normalized.contains(entry.as_str()));
            if !covered {
                findings.push(ConsistencyFinding::critical(
                    StageId::Layout,
                    format!("navigation omits content section '{}'", page_key),
                ));
            }
        }

        let page_keys: Vec<String> = pages.keys().map(|key| normalize(key)).collect();
        for entry in nav.iter().filter_map(Value::as_str) {
            let normalized = normalize(entry);
            let backed = page_keys
                .iter()
                .any(|key| key == &normalized || key.contains(normalized.as_str()));
            if !backed {
                findings.push(ConsistencyFinding::advisory(
                    StageId::Content,
                    format!("navigation entry '{}' has no matching content section", entry),
                ));
            }
        }
    }

    fn check_icons(&self, workspace: &Workspace, findings: &mut Vec<ConsistencyFinding>) {
        let library = workspace
            .value(StageId::Icons)
            .and_then(|icons| icons.get("icon_library"))
            .and_then(Value::as_str)
            .unwrap_or("");

        if library.is_empty() {
            findings.push(ConsistencyFinding::advisory(
                StageId::Icons,
                "icon strategy missing or empty",
            ));
        }
    }

    /// Required boilerplate in the emitted artifact
    fn check_artifact(&self, workspace: &Workspace, findings: &mut Vec<ConsistencyFinding>) {
        let Some(artifact) = workspace.artifact_html() else {
            findings.push(ConsistencyFinding::critical(
                StageId::Codegen,
                "website artifact missing",
            ));
            return;
        };

        // The structured content must be embedded in the emitted code
        if !artifact.contains("CONTENT_DATA") {
            findings.push(ConsistencyFinding::critical(
                StageId::Codegen,
                "CONTENT_DATA is not embedded in the artifact",
            ));
        }

        for script in cdn::REQUIRED {
            if !artifact.contains(script) {
                findings.push(ConsistencyFinding::critical(
                    StageId::Codegen,
                    format!("missing CDN script: {}", script),
                ));
            }
        }

        // The root mount point must exist before any script runs
        match (
            artifact.find(r#"id="root""#),
            artifact.find(r#"<script type="text/babel""#),
        ) {
            (None, _) => findings.push(ConsistencyFinding::critical(
                StageId::Codegen,
                "root mount point missing from artifact",
            )),
            (Some(root_pos), Some(script_pos)) if script_pos < root_pos => {
                findings.push(ConsistencyFinding::critical(
                    StageId::Codegen,
                    "root mount point appears after the application script",
                ));
            }
            _ => {}
        }
    }
}

/// Case/punctuation-insensitive comparison key for nav entries and page
/// keys ("Behavioral Patterns" vs "behavioral_patterns")
fn normalize(entry: &str) -> String {
    entry
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::workspace::ValidatedStageOutput;
    use serde_json::json;

    fn put(workspace: &mut Workspace, stage: StageId, value: Value) {
        workspace.put(ValidatedStageOutput {
            stage,
            value,
            degraded: false,
            attempts: 1,
        });
    }

    fn valid_artifact() -> String {
        format!(
            "<html><div id=\"root\"></div>\
             <script src=\"{}\"></script><script src=\"{}\"></script><script src=\"{}\"></script>\
             <script type=\"text/babel\">const CONTENT_DATA = {{}};</script></html>",
            crate::constants::cdn::REACT,
            crate::constants::cdn::REACT_DOM,
            crate::constants::cdn::BABEL_STANDALONE,
        )
    }

    fn consistent_workspace() -> Workspace {
        let mut workspace = Workspace::new();
        put(
            &mut workspace,
            StageId::Content,
            json!({"pages": {"home": {}, "behavioral_patterns": {}, "about": {}}}),
        );
        put(
            &mut workspace,
            StageId::Layout,
            json!({"navigation": {"structure": ["Home", "Patterns", "About"]}}),
        );
        put(&mut workspace, StageId::Icons, json!({"icon_library": "lucide"}));
        put(&mut workspace, StageId::Codegen, json!(valid_artifact()));
        workspace
    }

    #[test]
    fn test_consistent_workspace_has_no_critical_findings() {
        let reviewer = ConsistencyReviewer::new();
        let report = reviewer.review(&consistent_workspace());
        assert!(!report.has_critical(), "unexpected: {}", report.summary());
    }

    #[test]
    fn test_nav_omission_blames_layout_stage() {
        let mut workspace = consistent_workspace();
        put(
            &mut workspace,
            StageId::Layout,
            json!({"navigation": {"structure": ["Home", "About"]}}),
        );

        let report = ConsistencyReviewer::new().review(&workspace);
        let finding = report
            .findings
            .iter()
            .find(|f| f.message.contains("behavioral_patterns"))
            .expect("expected a nav-omission finding");
        assert_eq!(finding.owner, StageId::Layout);
        assert_eq!(finding.severity, Severity::Critical);
    }

    #[test]
    fn test_extra_nav_entry_is_advisory_against_content() {
        let mut workspace = consistent_workspace();
        put(
            &mut workspace,
            StageId::Layout,
            json!({"navigation": {"structure": ["Home", "Patterns", "About", "Blog"]}}),
        );

        let report = ConsistencyReviewer::new().review(&workspace);
        let finding = report
            .findings
            .iter()
            .find(|f| f.message.contains("Blog"))
            .expect("expected an extra-entry finding");
        assert_eq!(finding.owner, StageId::Content);
        assert_eq!(finding.severity, Severity::Advisory);
        assert!(!report.has_critical());
    }

    #[test]
    fn test_missing_content_data_is_critical() {
        let mut workspace = consistent_workspace();
        let artifact = valid_artifact().replace("CONTENT_DATA", "SOMETHING_ELSE");
        put(&mut workspace, StageId::Codegen, json!(artifact));

        let report = ConsistencyReviewer::new().review(&workspace);
        assert!(report.has_critical());
        assert!(
            report
                .critical_findings()
                .any(|f| f.owner == StageId::Codegen && f.message.contains("CONTENT_DATA"))
        );
    }

    #[test]
    fn test_missing_cdn_script_is_critical() {
        let mut workspace = consistent_workspace();
        let artifact = valid_artifact().replace("babel.min.js", "babel.txt");
        put(&mut workspace, StageId::Codegen, json!(artifact));

        let report = ConsistencyReviewer::new().review(&workspace);
        assert!(
            report
                .critical_findings()
                .any(|f| f.message.contains("babel"))
        );
    }

    #[test]
    fn test_root_after_script_is_ordering_finding() {
        let mut workspace = consistent_workspace();
        let artifact = format!(
            "<html><script type=\"text/babel\">const CONTENT_DATA = {{}};</script>\
             <div id=\"root\"></div>\
             <script src=\"{}\"></script><script src=\"{}\"></script><script src=\"{}\"></script></html>",
            crate::constants::cdn::REACT,
            crate::constants::cdn::REACT_DOM,
            crate::constants::cdn::BABEL_STANDALONE,
        );
        put(&mut workspace, StageId::Codegen, json!(artifact));

        let report = ConsistencyReviewer::new().review(&workspace);
        assert!(
            report
                .critical_findings()
                .any(|f| f.message.contains("after the application script"))
        );
    }

    #[test]
    fn test_decision_targets_single_stage() {
        let mut workspace = consistent_workspace();
        put(&mut workspace, StageId::Codegen, json!("<html></html>"));
        put(
            &mut workspace,
            StageId::Layout,
            json!({"navigation": {"structure": ["Home"]}}),
        );

        let reviewer = ConsistencyReviewer::new();
        let report = reviewer.review(&workspace);
        let decision = reviewer.decide(&report);

        assert!(decision.regenerate);
        // Exactly one stage is targeted even with criticals against two
        let target = decision.target.unwrap();
        assert!(target == StageId::Layout || target == StageId::Codegen);
        assert!(!decision.instruction.is_empty());
    }

    #[test]
    fn test_no_criticals_no_regeneration() {
        let reviewer = ConsistencyReviewer::new();
        let report = reviewer.review(&consistent_workspace());
        let decision = reviewer.decide(&report);
        assert!(!decision.regenerate);
        assert!(decision.target.is_none());
    }
}
