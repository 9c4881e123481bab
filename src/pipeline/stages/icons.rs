//! Icon-Strategy Stage
//!
//! Selects the icon set and placement strategy matching the design DNA.

use serde_json::{Value, json};

use crate::pipeline::runner::{PipelineStage, Prompt, StageContext};
use crate::pipeline::workspace::StageId;
use crate::schema::StageSchema;

use super::prompts::StagePrompts;
use super::schemas::StageSchemas;

pub struct IconsStage;

impl PipelineStage for IconsStage {
    fn id(&self) -> StageId {
        StageId::Icons
    }

    fn schema(&self) -> StageSchema {
        StageSchemas::icons_schema()
    }

    fn build_prompt(&self, ctx: &StageContext<'_>) -> Prompt {
        let design = ctx
            .workspace
            .value(StageId::Design)
            .cloned()
            .unwrap_or_default();
        let content = content_structure(ctx);
        let layout = ctx
            .workspace
            .value(StageId::Layout)
            .cloned()
            .unwrap_or_default();

        Prompt {
            system: StagePrompts::icons_system().to_string(),
            user: StagePrompts::icons_user(
                ctx.input.user_name(),
                &design,
                &content,
                &layout,
                &self.schema().format_instructions(),
            ),
        }
    }

    fn autocorrect(&self, value: Value, _ctx: &StageContext<'_>) -> Value {
        let Value::Object(mut map) = value else {
            return value;
        };

        for wrapper in ["icon_strategy", "icons", "result"] {
            if map.len() == 1
                && let Some(Value::Object(inner)) = map.remove(wrapper)
            {
                map = inner;
                break;
            }
        }

        // "library" instead of "icon_library"
        if !map.contains_key("icon_library")
            && let Some(library) = map.remove("library")
        {
            map.insert("icon_library".to_string(), library);
        }

        Value::Object(map)
    }

    fn fallback(&self, _ctx: &StageContext<'_>) -> Value {
        json!({
            "icon_library": "lucide",
            "cdn_url": "https://unpkg.com/lucide@latest/dist/umd/lucide.min.js",
            "color_scheme": "accent",
            "suggestions": [
                {"location": "navigation-home", "icon_name": "home", "purpose": "Home navigation"},
                {"location": "navigation-patterns", "icon_name": "puzzle", "purpose": "Patterns section"},
                {"location": "navigation-about", "icon_name": "user", "purpose": "About section"},
                {"location": "hero-decorative", "icon_name": "sparkles", "purpose": "Hero accent"},
                {"location": "pattern-cards", "icon_name": "target", "purpose": "Pattern indicators"},
            ],
            "usage_philosophy": "Minimal functional icons for navigation and section identification",
        })
    }
}

/// Compact summary of the content strategy for the icon prompt: section
/// names and counts, not full page bodies.
fn content_structure(ctx: &StageContext<'_>) -> Value {
    let content = ctx.workspace.value(StageId::Content);
    let pages = content
        .and_then(|c| c.get("pages"))
        .and_then(Value::as_object);

    let sections: Vec<&String> = pages.map(|p| p.keys().collect()).unwrap_or_default();
    let pattern_count = pages
        .and_then(|p| p.get("behavioral_patterns"))
        .and_then(|patterns| patterns.get("patterns"))
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0);

    json!({
        "sections": sections,
        "pattern_count": pattern_count,
        "has_failures": pages.is_some_and(|p| p.contains_key("failures_and_lessons")),
        "has_decisions": pages.is_some_and(|p| p.contains_key("decision_architecture")),
    })
}
