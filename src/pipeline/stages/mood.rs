//! Deterministic Mood Derivation
//!
//! The one non-generative stage. An earlier design asked the model for a
//! mood system and suffered constant malformed output for something with
//! only a handful of reasonable answers; this replaces that call with a
//! pure function, eliminating the failure mode entirely.
//!
//! A stable hash of the three vibe inputs indexes each catalog
//! independently, so identical inputs always yield the identical
//! palette/fonts/style combination - across calls and across process
//! restarts.

use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::constants::catalog;
use crate::pipeline::workspace::{PipelineInput, StageId, ValidatedStageOutput};

/// Derive the mood system from the vibe inputs. Pure function: no
/// generative call, no I/O, no hidden randomness.
pub fn derive(input: &PipelineInput) -> ValidatedStageOutput {
    let color = vibe_field(input, "favorite_color", "blue");
    let animal = vibe_field(input, "animal", "wolf");
    let word = vibe_field(input, "abstract_word", "flow");

    let vibe_hash = stable_hash(&format!("{}{}{}", color, animal, word));

    let palette_idx = (vibe_hash % catalog::COLOR_PALETTES.len() as u128) as usize;
    let fonts_idx = (vibe_hash % catalog::FONT_PAIRINGS.len() as u128) as usize;
    let style_idx = (vibe_hash % catalog::STYLE_LABELS.len() as u128) as usize;

    let [primary, secondary, accent, background, text] = catalog::COLOR_PALETTES[palette_idx];
    let [heading, body] = catalog::FONT_PAIRINGS[fonts_idx];
    let layout_style = catalog::STYLE_LABELS[style_idx];

    debug!(
        "Mood derivation: palette #{}, fonts #{}, style '{}'",
        palette_idx, fonts_idx, layout_style
    );

    let mood_keywords = vec![
        color.to_lowercase(),
        animal.to_lowercase(),
        layout_style
            .split_whitespace()
            .next()
            .unwrap_or("balanced")
            .to_lowercase(),
    ];

    let value = json!({
        "colors": {
            "primary": primary,
            "secondary": secondary,
            "accent": accent,
            "background": background,
            "text": text,
        },
        "fonts": {
            "heading": heading,
            "body": body,
        },
        "layout_style": layout_style,
        "mood_keywords": mood_keywords,
        "reasoning": format!(
            "Deterministically selected from vibe inputs (hash: {})",
            vibe_hash % 1000
        ),
    });

    ValidatedStageOutput {
        stage: StageId::Mood,
        value,
        degraded: false,
        attempts: 0,
    }
}

fn vibe_field<'a>(input: &'a PipelineInput, key: &str, default: &'a str) -> &'a str {
    input
        .vibe
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

/// SHA-256 of the input, first 16 bytes as a big-endian u128.
///
/// Stable across platforms and process restarts, unlike `DefaultHasher`.
fn stable_hash(input: &str) -> u128 {
    let digest = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    u128::from_be_bytes(bytes)
}
