//! Design-DNA Stage
//!
//! Selects the archetype/layout/motion/theme combination plus palette and
//! typography from the user's answers, vibe, and the derived mood system.

use serde_json::{Value, json};

use crate::pipeline::runner::{PipelineStage, Prompt, StageContext};
use crate::pipeline::workspace::StageId;
use crate::schema::StageSchema;

use super::prompts::StagePrompts;
use super::schemas::StageSchemas;

pub struct DesignStage;

impl PipelineStage for DesignStage {
    fn id(&self) -> StageId {
        StageId::Design
    }

    fn schema(&self) -> StageSchema {
        StageSchemas::design_schema()
    }

    fn build_prompt(&self, ctx: &StageContext<'_>) -> Prompt {
        let answers = serde_json::to_value(&ctx.input.answers).unwrap_or_default();
        let vibe = serde_json::to_value(&ctx.input.vibe).unwrap_or_default();
        let mood = ctx
            .workspace
            .value(StageId::Mood)
            .cloned()
            .unwrap_or_default();

        Prompt {
            system: StagePrompts::design_system().to_string(),
            user: StagePrompts::design_user(
                &answers,
                &vibe,
                &mood,
                &ctx.input.raw_text,
                &self.schema().format_instructions(),
            ),
        }
    }

    fn autocorrect(&self, value: Value, _ctx: &StageContext<'_>) -> Value {
        let Value::Object(mut map) = value else {
            return value;
        };

        // Whole output nested under a single wrapper key
        for wrapper in ["design_dna", "design", "result"] {
            if map.len() == 1
                && let Some(Value::Object(inner)) = map.remove(wrapper)
            {
                map = inner;
                break;
            }
        }

        // typography_pair returned as a two-element array instead of an object
        if let Some(Value::Array(fonts)) = map.get("typography_pair")
            && fonts.len() == 2
            && fonts.iter().all(Value::is_string)
        {
            let pair = json!({"heading": fonts[0], "body": fonts[1]});
            map.insert("typography_pair".to_string(), pair);
        }

        Value::Object(map)
    }

    fn fallback(&self, _ctx: &StageContext<'_>) -> Value {
        json!({
            "archetype": "case_study",
            "layout": "bento_grid",
            "motion": "micro_interactions",
            "theme": "minimal_zen",
            "color_palette": ["#ffffff", "#000000", "#f3f4f6", "#3b82f6", "#1f2937"],
            "typography_pair": {"heading": "Inter", "body": "Inter"},
            "reasoning": "Fallback design system",
        })
    }
}
