//! Stage Output Schemas
//!
//! Declarative shapes for every stage's output. Required fields form the
//! minimal subtree each stage's fallback must satisfy; everything else is
//! optional-with-default so a partially-populated model response still
//! validates and simply renders empty downstream.

use serde_json::json;

use crate::schema::{FieldKind, FieldSpec, StageSchema};

/// Schema provider for pipeline stages
pub struct StageSchemas;

impl StageSchemas {
    /// Output of the deterministic mood derivation
    pub fn mood_schema() -> StageSchema {
        StageSchema::new(
            "mood_system",
            vec![
                FieldSpec::required(
                    "colors",
                    FieldKind::Object(vec![
                        FieldSpec::required("primary", FieldKind::String),
                        FieldSpec::required("secondary", FieldKind::String),
                        FieldSpec::required("accent", FieldKind::String),
                        FieldSpec::required("background", FieldKind::String),
                        FieldSpec::required("text", FieldKind::String),
                    ]),
                ),
                FieldSpec::required(
                    "fonts",
                    FieldKind::Object(vec![
                        FieldSpec::required("heading", FieldKind::String),
                        FieldSpec::required("body", FieldKind::String),
                    ]),
                ),
                FieldSpec::required("layout_style", FieldKind::String)
                    .describe("Name of the visual style (e.g. Minimalist, Brutalist)"),
                FieldSpec::optional_empty("mood_keywords", FieldKind::StringList),
                FieldSpec::optional("reasoning", FieldKind::String, json!("")),
            ],
        )
    }

    /// Output of the design-DNA stage
    pub fn design_schema() -> StageSchema {
        StageSchema::new(
            "design_dna",
            vec![
                FieldSpec::required("archetype", FieldKind::String).describe(
                    "Content archetype (e.g. manifesto, case_study, timeline_journey)",
                ),
                FieldSpec::required("layout", FieldKind::String)
                    .describe("Layout engine (e.g. bento_grid, asymmetric_scatter)"),
                FieldSpec::required("theme", FieldKind::String)
                    .describe("Visual theme (e.g. neo_brutalist, glassmorphism, minimal_zen)"),
                FieldSpec::optional("motion", FieldKind::String, json!("micro_interactions"))
                    .describe("Motion style (e.g. parallax_deep, brutal_static)"),
                FieldSpec::optional(
                    "color_palette",
                    FieldKind::StringList,
                    json!(["#ffffff", "#000000", "#f3f4f6", "#3b82f6", "#1f2937"]),
                )
                .describe("5 hex colors: primary, secondary, accent, background, text"),
                FieldSpec::optional(
                    "typography_pair",
                    FieldKind::Object(vec![
                        FieldSpec::optional("heading", FieldKind::String, json!("Inter")),
                        FieldSpec::optional("body", FieldKind::String, json!("Inter")),
                    ]),
                    json!({"heading": "Inter", "body": "Inter"}),
                ),
                FieldSpec::optional("reasoning", FieldKind::String, json!(""))
                    .describe("Why this combination fits the user"),
            ],
        )
    }

    /// Output of the content-strategy stage.
    ///
    /// `pages` is open-ended: only `home` is pinned down; other page keys
    /// (behavioral_patterns, failures_and_lessons, ...) pass through as
    /// the model shapes them.
    pub fn content_schema() -> StageSchema {
        StageSchema::new(
            "content_strategy",
            vec![
                FieldSpec::required(
                    "pages",
                    FieldKind::Object(vec![FieldSpec::optional(
                        "home",
                        FieldKind::Object(vec![
                            FieldSpec::optional(
                                "thesis",
                                FieldKind::String,
                                json!("Analysis in progress"),
                            ),
                            FieldSpec::optional_empty("introduction", FieldKind::StringList),
                            FieldSpec::optional(
                                "navigation_prompt",
                                FieldKind::String,
                                json!("Explore the sections above"),
                            ),
                        ]),
                        json!({
                            "thesis": "Analysis in progress",
                            "introduction": [],
                            "navigation_prompt": "Explore the sections above"
                        }),
                    )]),
                ),
                FieldSpec::optional(
                    "meta",
                    FieldKind::Object(vec![
                        FieldSpec::optional(
                            "site_title",
                            FieldKind::String,
                            json!("Professional Fingerprint"),
                        ),
                        FieldSpec::optional(
                            "navigation_structure",
                            FieldKind::StringList,
                            json!(["Home", "Patterns", "About"]),
                        ),
                    ]),
                    json!({
                        "site_title": "Professional Fingerprint",
                        "navigation_structure": ["Home", "Patterns", "About"]
                    }),
                ),
            ],
        )
    }

    /// Output of the UX-plan stage
    pub fn layout_schema() -> StageSchema {
        StageSchema::new(
            "ux_plan",
            vec![
                FieldSpec::required(
                    "navigation",
                    FieldKind::Object(vec![
                        FieldSpec::optional("type", FieldKind::String, json!("fixed-top-nav")),
                        FieldSpec::required("structure", FieldKind::StringList)
                            .describe("Ordered navigation entries"),
                        FieldSpec::optional("style", FieldKind::String, json!("Fixed header")),
                    ]),
                ),
                FieldSpec::optional_empty(
                    "pages",
                    FieldKind::ObjectList(vec![
                        FieldSpec::optional("id", FieldKind::String, json!("page")),
                        FieldSpec::optional("layout", FieldKind::String, json!("full-width")),
                        FieldSpec::optional_empty("components", FieldKind::StringList),
                        FieldSpec::optional_empty("animations", FieldKind::StringList),
                        FieldSpec::optional(
                            "scroll_behavior",
                            FieldKind::String,
                            json!("smooth"),
                        ),
                    ]),
                ),
                FieldSpec::optional(
                    "typography_system",
                    FieldKind::Object(vec![
                        FieldSpec::optional("custom_fonts", FieldKind::String, json!("Inter")),
                        FieldSpec::optional("font_scale", FieldKind::String, json!("Standard")),
                    ]),
                    json!({"custom_fonts": "Inter", "font_scale": "Standard"}),
                ),
                FieldSpec::optional(
                    "animation_strategy",
                    FieldKind::Object(vec![FieldSpec::optional(
                        "style",
                        FieldKind::String,
                        json!("Subtle and polished"),
                    )]),
                    json!({"style": "Subtle and polished"}),
                ),
            ],
        )
    }

    /// Output of the icon-strategy stage
    pub fn icons_schema() -> StageSchema {
        StageSchema::new(
            "icon_strategy",
            vec![
                FieldSpec::required("icon_library", FieldKind::String)
                    .describe("Icon library to use (lucide, heroicons, phosphor, feather)"),
                FieldSpec::optional(
                    "cdn_url",
                    FieldKind::String,
                    json!("https://unpkg.com/lucide@latest/dist/umd/lucide.min.js"),
                ),
                FieldSpec::optional("color_scheme", FieldKind::String, json!("accent"))
                    .describe("How icons are colored (accent, gradient, monochrome)"),
                FieldSpec::optional_empty(
                    "suggestions",
                    FieldKind::ObjectList(vec![
                        FieldSpec::required("location", FieldKind::String)
                            .describe("Where to place the icon (e.g. navigation, hero)"),
                        FieldSpec::required("icon_name", FieldKind::String),
                        FieldSpec::optional("purpose", FieldKind::String, json!("")),
                    ]),
                ),
                FieldSpec::optional(
                    "usage_philosophy",
                    FieldKind::String,
                    json!("Minimal functional icons for navigation and section identification"),
                ),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_design_minimal_subtree() {
        let schema = StageSchemas::design_schema();
        let validated = schema
            .validate(&json!({
                "archetype": "case_study",
                "layout": "bento_grid",
                "theme": "minimal_zen"
            }))
            .unwrap();
        // Optional fields materialize with defaults
        assert_eq!(validated["motion"], "micro_interactions");
        assert_eq!(validated["color_palette"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_content_open_ended_pages_preserved() {
        let schema = StageSchemas::content_schema();
        let validated = schema
            .validate(&json!({
                "pages": {
                    "home": {"thesis": "T"},
                    "behavioral_patterns": {"patterns": [{"name": "Deep focus"}]}
                }
            }))
            .unwrap();
        assert_eq!(
            validated["pages"]["behavioral_patterns"]["patterns"][0]["name"],
            "Deep focus"
        );
        // home defaults filled in place
        assert_eq!(validated["pages"]["home"]["navigation_prompt"], "Explore the sections above");
    }

    #[test]
    fn test_layout_requires_navigation_structure() {
        let schema = StageSchemas::layout_schema();
        assert!(schema.validate(&json!({"navigation": {}})).is_err());
        assert!(
            schema
                .validate(&json!({"navigation": {"structure": ["Home"]}}))
                .is_ok()
        );
    }

    #[test]
    fn test_icons_suggestion_elements_validated() {
        let schema = StageSchemas::icons_schema();
        let err = schema
            .validate(&json!({
                "icon_library": "lucide",
                "suggestions": [{"location": "hero"}]
            }))
            .unwrap_err();
        assert!(err.field.unwrap().contains("suggestions[0].icon_name"));
    }
}
