//! Stage Prompts
//!
//! System and user prompt templates for the generative stages. Upstream
//! workspace data is inlined as pretty-printed JSON, capped so one large
//! upload cannot blow the context window.

use serde_json::Value;

use crate::constants::prompt as limits;
use crate::types::truncate_chars;

/// Prompt builders for pipeline stages
pub struct StagePrompts;

impl StagePrompts {
    // =========================================================================
    // Design DNA
    // =========================================================================

    pub fn design_system() -> &'static str {
        r#"You are a world-class Art Director and Creative Technologist.
Design a COMPLETELY UNIQUE digital portfolio identity from the user's personality.

Select one option per layer:

1. LAYOUT ENGINE: single_stream, bento_grid, asymmetric_scatter, horizontal_gallery, split_screen, terminal_console, magazine_editorial
2. MOTION ENGINE: parallax_deep, scroll_jacking, micro_interactions, brutal_static, liquid_fluid, 3d_transforms, typewriter_reveal
3. VISUAL THEME: neo_brutalist, glassmorphism, minimal_zen, cyberpunk_neon, paper_collage, corporate_clean, swiss_international, vaporwave_retro
4. CONTENT ARCHETYPE: manifesto, case_study, timeline_journey, skill_tree, anti_resume, digital_garden

Analyze the user's answers and vibe deeply. Do NOT default to bento_grid or
minimal_zen. A chaotic creative might get asymmetric_scatter + liquid_fluid +
neo_brutalist; a senior backend dev terminal_console + typewriter_reveal +
cyberpunk_neon. Mix boldly."#
    }

    pub fn design_user(
        answers: &Value,
        vibe: &Value,
        mood: &Value,
        raw_text: &str,
        instructions: &str,
    ) -> String {
        format!(
            "USER ANSWERS:\n{}\n\nVIBE CHECK:\n{}\n\nMOOD SYSTEM (derived, keep colors/fonts consistent with it):\n{}\n\nCONTENT EXCERPT:\n{}\n\n{}",
            pretty(answers),
            pretty(vibe),
            pretty(mood),
            truncate_chars(raw_text, limits::MAX_DESIGN_EXCERPT_CHARS),
            instructions
        )
    }

    // =========================================================================
    // Content Strategy
    // =========================================================================

    pub fn content_system() -> &'static str {
        r#"You are a Content Strategist and Behavioral Analyst for professional fingerprinting.

Extract and curate the user's professional psyche into a multi-chapter thesis.
This is NOT a CV and NOT a portfolio - it is a forensic interpretation of how
they think, decide, and fail.

RULES:
1. No job titles, employment timelines, or standard skill lists
2. Do not invent or exaggerate - use ONLY what is evident in the data
3. Multi-paragraph content per section with examples, reasoning, trade-offs
4. Write in FIRST PERSON from the user's perspective
5. Concise, impactful headings (3-7 words)
6. Every piece of content must reveal something NON-OBVIOUS
7. Plan one dedicated page per major section

The top-level structure MUST be:
{"pages": {"home": {...}, ...}, "meta": {"site_title": "...", "navigation_structure": [...]}}"#
    }

    pub fn content_user(answers: &Value, raw_text: &str, instructions: &str) -> String {
        format!(
            "USER INTERVIEW ANSWERS:\n{}\n\nRAW DATA:\n{}\n\n{}",
            pretty(answers),
            truncate_chars(raw_text, limits::MAX_RAW_TEXT_CHARS),
            instructions
        )
    }

    // =========================================================================
    // UX Plan
    // =========================================================================

    pub fn layout_system() -> &'static str {
        r#"You are a Senior UX Architect and Information Designer.
Design a UNIQUE site structure driven by the design DNA archetype: navigation,
per-page layouts, a typography system, and an animation strategy. Navigation
entries must correspond to the content pages that actually exist."#
    }

    pub fn layout_user(
        user_name: &str,
        design: &Value,
        content: &Value,
        media_names: &[String],
        instructions: &str,
    ) -> String {
        let image_info = if media_names.is_empty() {
            "No images uploaded.".to_string()
        } else {
            format!(
                "Available images ({} files):\n{}",
                media_names.len(),
                media_names
                    .iter()
                    .map(|name| format!("  - {}", name))
                    .collect::<Vec<_>>()
                    .join("\n")
            )
        };

        format!(
            "Design UX for: {}\n\nDESIGN DNA:\n{}\n\nCONTENT STRATEGY:\n{}\n\n{}\n\n{}",
            user_name,
            capped(design),
            capped(content),
            image_info,
            instructions
        )
    }

    // =========================================================================
    // Icon Strategy
    // =========================================================================

    pub fn icons_system() -> &'static str {
        r#"You are an expert UI/UX Designer specializing in iconography.
Select ONE cohesive icon library (lucide, heroicons, phosphor, or feather)
matching the design DNA, and 3-8 meaningful icon placements (navigation,
section headers, feature cards, one optional hero accent). Match content
meaning (target for goals, puzzle for patterns, bolt for decisions) and keep
one consistent style - all outlined or all filled, never mixed."#
    }

    pub fn icons_user(
        user_name: &str,
        design: &Value,
        content: &Value,
        layout: &Value,
        instructions: &str,
    ) -> String {
        format!(
            "Curate icons for: {}\n\nDESIGN DNA:\n{}\n\nCONTENT STRUCTURE:\n{}\n\nUX PLAN:\n{}\n\n{}",
            user_name,
            capped(design),
            capped(content),
            capped(layout),
            instructions
        )
    }

    // =========================================================================
    // Code Generation
    // =========================================================================

    pub fn codegen_system() -> &'static str {
        r#"You are a senior front-end developer generating a COMPLETE single-file website.

HARD CONSTRAINTS - THIS IS A SINGLE HTML FILE SYSTEM:
- No build pipeline (no Vite, no Webpack, no npm)
- React 18 UMD + ReactDOM UMD + Babel standalone + Tailwind + Framer Motion, all from CDN
- The file must open directly in a browser
- A <div id="root"></div> mount point BEFORE the Babel script runs
- Embed the full content as `const CONTENT_DATA = {...};` inside the script
- Navigation must match the UX plan; every content page must render
- Use the design DNA colors and fonts (Google Fonts link)

Return ONLY the HTML document, starting with <!DOCTYPE html>. No markdown
fences, no commentary."#
    }

    pub fn codegen_user(
        user_name: &str,
        design: &Value,
        content: &Value,
        layout: &Value,
        icons: &Value,
        feedback: Option<&str>,
    ) -> String {
        let mut prompt = format!(
            "Generate the site for: {}\n\nDESIGN DNA:\n{}\n\nCONTENT_DATA (embed verbatim):\n{}\n\nUX PLAN:\n{}\n\nICON STRATEGY:\n{}",
            user_name,
            capped(design),
            pretty(content),
            capped(layout),
            capped(icons),
        );

        if let Some(feedback) = feedback {
            prompt.push_str("\n\nREVIEWER FEEDBACK - fix these issues in this revision:\n");
            prompt.push_str(feedback);
        }

        prompt
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Pretty-print with the upstream JSON cap applied
fn capped(value: &Value) -> String {
    let rendered = pretty(value);
    truncate_chars(&rendered, limits::MAX_UPSTREAM_JSON_CHARS).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_user_caps_raw_text() {
        let long_text = "x".repeat(100_000);
        let prompt = StagePrompts::content_user(&json!({}), &long_text, "match the schema");
        assert!(prompt.len() < 30_000);
        assert!(prompt.contains("RAW DATA"));
    }

    #[test]
    fn test_codegen_user_appends_feedback() {
        let empty = json!({});
        let without =
            StagePrompts::codegen_user("Ada", &empty, &empty, &empty, &empty, None);
        let with = StagePrompts::codegen_user(
            "Ada",
            &empty,
            &empty,
            &empty,
            &empty,
            Some("missing Babel CDN"),
        );
        assert!(!without.contains("REVIEWER FEEDBACK"));
        assert!(with.contains("REVIEWER FEEDBACK"));
        assert!(with.contains("missing Babel CDN"));
    }
}
