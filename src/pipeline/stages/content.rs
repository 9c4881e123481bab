//! Content-Strategy Stage
//!
//! The central stage: decides what goes on the site. Depends on nothing
//! but the raw text and the questionnaire answers.
//!
//! Models reliably violate the pages/meta nesting even when the content
//! itself is good, so this stage carries the heaviest structural
//! auto-correction in the pipeline: page keys returned at the top level
//! are re-wrapped, and missing `meta`/`home` subtrees are synthesized
//! before validation.

use serde_json::{Map, Value, json};

use crate::pipeline::runner::{PipelineStage, Prompt, StageContext};
use crate::pipeline::workspace::StageId;
use crate::schema::StageSchema;

use super::prompts::StagePrompts;
use super::schemas::StageSchemas;

/// Page keys the strategist is known to emit; used to detect an
/// unwrapped top-level page map.
const KNOWN_PAGE_KEYS: &[&str] = &[
    "home",
    "behavioral_patterns",
    "anti_claims",
    "failures_and_lessons",
    "decision_architecture",
    "proprietary_method",
    "about",
];

pub struct ContentStage;

impl PipelineStage for ContentStage {
    fn id(&self) -> StageId {
        StageId::Content
    }

    fn schema(&self) -> StageSchema {
        StageSchemas::content_schema()
    }

    fn build_prompt(&self, ctx: &StageContext<'_>) -> Prompt {
        let answers = serde_json::to_value(&ctx.input.answers).unwrap_or_default();

        Prompt {
            system: StagePrompts::content_system().to_string(),
            user: StagePrompts::content_user(
                &answers,
                &ctx.input.raw_text,
                &self.schema().format_instructions(),
            ),
        }
    }

    fn autocorrect(&self, value: Value, ctx: &StageContext<'_>) -> Value {
        let Value::Object(mut map) = value else {
            return value;
        };

        // Model returned the page map unwrapped at the top level
        if !map.contains_key("pages")
            && !map.contains_key("meta")
            && KNOWN_PAGE_KEYS.iter().any(|key| map.contains_key(*key))
        {
            let pages = std::mem::take(&mut map);
            map = Map::new();
            map.insert("pages".to_string(), Value::Object(pages));
        }

        if !map.contains_key("pages") {
            map.insert(
                "pages".to_string(),
                json!({"home": default_home_page()}),
            );
        }

        // Synthesize meta from what we know: the user's name as the site
        // title, the page keys as navigation
        if !map.contains_key("meta") {
            let nav: Vec<String> = map
                .get("pages")
                .and_then(Value::as_object)
                .map(|pages| pages.keys().cloned().collect())
                .unwrap_or_default();
            map.insert(
                "meta".to_string(),
                json!({
                    "site_title": ctx.input.user_name(),
                    "navigation_structure": nav,
                }),
            );
        }

        // A home page must always exist
        if let Some(Value::Object(pages)) = map.get_mut("pages")
            && !pages.contains_key("home")
        {
            pages.insert("home".to_string(), default_home_page());
        }

        Value::Object(map)
    }

    fn fallback(&self, ctx: &StageContext<'_>) -> Value {
        json!({
            "pages": {
                "home": default_home_page(),
                "behavioral_patterns": {
                    "page_title": "Patterns",
                    "introduction": ["Analyzing behavioral patterns..."],
                    "patterns": [],
                },
                "about": {
                    "page_title": "About",
                    "introduction": ["Get in touch to learn more."],
                    "guidelines": [],
                    "contact_prompt": "Get in touch",
                },
            },
            "meta": {
                "site_title": ctx.input.user_name(),
                "navigation_structure": ["Home", "Patterns", "About"],
            },
        })
    }
}

fn default_home_page() -> Value {
    json!({
        "thesis": "Analysis in progress",
        "introduction": ["Generating content..."],
        "navigation_prompt": "Explore",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::workspace::{PipelineInput, Workspace};

    fn named_input(name: &str) -> PipelineInput {
        let mut input = PipelineInput::default();
        input
            .answers
            .insert("who_are_you".to_string(), name.to_string());
        input
    }

    fn ctx<'a>(input: &'a PipelineInput, workspace: &'a Workspace) -> StageContext<'a> {
        StageContext {
            input,
            workspace,
            feedback: None,
        }
    }

    #[test]
    fn test_fallback_satisfies_schema_and_carries_name() {
        let input = named_input("Jordan");
        let workspace = Workspace::new();
        let fallback = ContentStage.fallback(&ctx(&input, &workspace));
        assert!(ContentStage.schema().validate(&fallback).is_ok());
        assert_eq!(fallback["meta"]["site_title"], "Jordan");
    }

    #[test]
    fn test_autocorrect_wraps_unwrapped_pages() {
        let input = named_input("Jordan");
        let workspace = Workspace::new();

        // Expected leaf content returned unwrapped at the top level
        let unwrapped = json!({
            "home": {"thesis": "I stage rollouts now"},
            "behavioral_patterns": {"patterns": []}
        });

        let corrected = ContentStage.autocorrect(unwrapped, &ctx(&input, &workspace));
        assert_eq!(corrected["pages"]["home"]["thesis"], "I stage rollouts now");
        assert_eq!(corrected["meta"]["site_title"], "Jordan");
        assert!(ContentStage.schema().validate(&corrected).is_ok());
    }

    #[test]
    fn test_autocorrect_synthesizes_missing_meta_nav_from_pages() {
        let input = named_input("Jordan");
        let workspace = Workspace::new();

        let value = json!({"pages": {"home": {}, "about": {}}});
        let corrected = ContentStage.autocorrect(value, &ctx(&input, &workspace));
        let nav = corrected["meta"]["navigation_structure"].as_array().unwrap();
        assert!(nav.iter().any(|entry| entry == "about"));
    }

    #[test]
    fn test_autocorrect_guarantees_home() {
        let input = named_input("Jordan");
        let workspace = Workspace::new();

        let value = json!({"pages": {"about": {}}, "meta": {"site_title": "X"}});
        let corrected = ContentStage.autocorrect(value, &ctx(&input, &workspace));
        assert_eq!(corrected["pages"]["home"]["thesis"], "Analysis in progress");
    }

    #[test]
    fn test_autocorrect_leaves_wellformed_output_alone() {
        let input = named_input("Jordan");
        let workspace = Workspace::new();

        let value = json!({
            "pages": {"home": {"thesis": "T"}},
            "meta": {"site_title": "S", "navigation_structure": ["Home"]}
        });
        let corrected = ContentStage.autocorrect(value.clone(), &ctx(&input, &workspace));
        assert_eq!(corrected["meta"]["site_title"], "S");
        assert_eq!(corrected["pages"]["home"]["thesis"], "T");
    }
}
