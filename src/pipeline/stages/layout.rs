//! UX-Plan Stage
//!
//! Plans the site structure from the design DNA archetype and the content
//! strategy: navigation, per-page layouts, typography, animation.

use serde_json::{Value, json};

use crate::pipeline::runner::{PipelineStage, Prompt, StageContext};
use crate::pipeline::workspace::StageId;
use crate::schema::StageSchema;

use super::prompts::StagePrompts;
use super::schemas::StageSchemas;

pub struct LayoutStage;

impl PipelineStage for LayoutStage {
    fn id(&self) -> StageId {
        StageId::Layout
    }

    fn schema(&self) -> StageSchema {
        StageSchemas::layout_schema()
    }

    fn build_prompt(&self, ctx: &StageContext<'_>) -> Prompt {
        let design = ctx
            .workspace
            .value(StageId::Design)
            .cloned()
            .unwrap_or_default();
        let content = ctx
            .workspace
            .value(StageId::Content)
            .cloned()
            .unwrap_or_default();

        let media_names: Vec<String> = ctx
            .input
            .media_files
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();

        Prompt {
            system: StagePrompts::layout_system().to_string(),
            user: StagePrompts::layout_user(
                ctx.input.user_name(),
                &design,
                &content,
                &media_names,
                &self.schema().format_instructions(),
            ),
        }
    }

    fn autocorrect(&self, value: Value, _ctx: &StageContext<'_>) -> Value {
        let Value::Object(mut map) = value else {
            return value;
        };

        for wrapper in ["ux_plan", "plan", "result"] {
            if map.len() == 1
                && let Some(Value::Object(inner)) = map.remove(wrapper)
            {
                map = inner;
                break;
            }
        }

        // Navigation returned as a bare list of entries
        if let Some(Value::Array(entries)) = map.get("navigation")
            && entries.iter().all(Value::is_string)
        {
            let structure = Value::Array(entries.clone());
            map.insert(
                "navigation".to_string(),
                json!({
                    "type": "fixed-top-nav",
                    "structure": structure,
                    "style": "Fixed header",
                }),
            );
        }

        Value::Object(map)
    }

    fn fallback(&self, ctx: &StageContext<'_>) -> Value {
        let archetype = ctx
            .workspace
            .value(StageId::Design)
            .and_then(|design| design.get("archetype"))
            .and_then(Value::as_str)
            .unwrap_or("case_study");

        let page_names = match archetype {
            "manifesto" => ["Manifesto", "Beliefs", "Work", "Contact"],
            "timeline_journey" => ["Journey", "Milestones", "Now", "Contact"],
            "skill_tree" => ["Skills", "Projects", "Tools", "Contact"],
            "anti_resume" => ["Boundaries", "Failures", "Learnings", "Contact"],
            "digital_garden" => ["Garden", "Notes", "Links", "Contact"],
            "case_study" => ["Overview", "Process", "Work", "Contact"],
            _ => ["Home", "Work", "About", "Contact"],
        };

        let heading_font = ctx
            .workspace
            .value(StageId::Design)
            .and_then(|design| design.pointer("/typography_pair/heading"))
            .and_then(Value::as_str)
            .unwrap_or("Inter");

        json!({
            "navigation": {
                "type": "fixed-top-nav",
                "structure": page_names,
                "style": "Fixed header",
            },
            "pages": [{
                "id": "page1",
                "layout": "full-width",
                "components": ["Hero"],
                "animations": [],
                "scroll_behavior": "smooth",
            }],
            "typography_system": {
                "custom_fonts": heading_font,
                "font_scale": "Standard",
            },
            "animation_strategy": {"style": "Subtle and polished"},
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::workspace::{PipelineInput, ValidatedStageOutput, Workspace};

    fn ctx<'a>(input: &'a PipelineInput, workspace: &'a Workspace) -> StageContext<'a> {
        StageContext {
            input,
            workspace,
            feedback: None,
        }
    }

    fn workspace_with_design(design: Value) -> Workspace {
        let mut workspace = Workspace::new();
        workspace.put(ValidatedStageOutput {
            stage: StageId::Design,
            value: design,
            degraded: false,
            attempts: 1,
        });
        workspace
    }

    #[test]
    fn test_fallback_satisfies_schema() {
        let input = PipelineInput::default();
        let workspace = Workspace::new();
        let fallback = LayoutStage.fallback(&ctx(&input, &workspace));
        assert!(LayoutStage.schema().validate(&fallback).is_ok());
    }

    #[test]
    fn test_fallback_follows_archetype() {
        let input = PipelineInput::default();
        let workspace = workspace_with_design(json!({"archetype": "anti_resume"}));
        let fallback = LayoutStage.fallback(&ctx(&input, &workspace));
        let structure = fallback["navigation"]["structure"].as_array().unwrap();
        assert_eq!(structure[1], "Failures");
    }

    #[test]
    fn test_autocorrect_wraps_bare_navigation_list() {
        let input = PipelineInput::default();
        let workspace = Workspace::new();
        let value = json!({"navigation": ["Home", "Work", "Contact"]});
        let corrected = LayoutStage.autocorrect(value, &ctx(&input, &workspace));
        assert_eq!(corrected["navigation"]["structure"][0], "Home");
        assert!(LayoutStage.schema().validate(&corrected).is_ok());
    }

    #[test]
    fn test_prompt_lists_media_files() {
        let mut input = PipelineInput::default();
        input.media_files.push("uploads/headshot.png".into());
        let workspace = Workspace::new();

        let prompt = LayoutStage.build_prompt(&ctx(&input, &workspace));
        assert!(prompt.user.contains("headshot.png"));
    }
}
