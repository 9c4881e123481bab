//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/platogen/) and project (./platogen.toml)
//! level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{network, retry};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Stage retry and regeneration policy
    pub pipeline: PipelineConfig,

    /// Generated-site output settings
    pub site: SiteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            pipeline: PipelineConfig::default(),
            site: SiteConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `PlatoError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if self.llm.timeout_secs == 0 {
            return Err(crate::types::PlatoError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.max_attempts == 0 {
            return Err(crate::types::PlatoError::Config(
                "pipeline.max_attempts must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.pipeline.base_temperature) {
            return Err(crate::types::PlatoError::Config(format!(
                "pipeline.base_temperature must be between 0.0 and 2.0, got {}",
                self.pipeline.base_temperature
            )));
        }

        if self.pipeline.max_temperature < self.pipeline.base_temperature {
            return Err(crate::types::PlatoError::Config(format!(
                "pipeline.max_temperature ({}) is below base_temperature ({})",
                self.pipeline.max_temperature, self.pipeline.base_temperature
            )));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider type: "openai", "ollama"
    pub provider: String,

    /// Model name (provider-specific)
    pub model: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum tokens per generative call
    pub max_output_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            api_base: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            max_output_tokens: network::DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

// =============================================================================
// Pipeline Policy
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Generative attempts per stage before substituting the fallback
    pub max_attempts: u32,

    /// Temperature of the first attempt
    pub base_temperature: f32,

    /// Temperature added per failed attempt
    pub temperature_step: f32,

    /// Temperature ceiling across retries
    pub max_temperature: f32,

    /// Allow the reviewer to trigger one bounded stage re-run.
    ///
    /// Off by default: regeneration is expensive and occasionally produces
    /// a worse artifact. The single-pass bound is fixed, not configurable.
    pub regeneration_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
            base_temperature: retry::BASE_TEMPERATURE,
            temperature_step: retry::TEMPERATURE_STEP,
            max_temperature: retry::MAX_TEMPERATURE,
            regeneration_enabled: false,
        }
    }
}

impl PipelineConfig {
    /// Temperature for a given zero-based attempt index
    pub fn temperature_for_attempt(&self, attempt: u32) -> f32 {
        (self.base_temperature + self.temperature_step * attempt as f32)
            .min(self.max_temperature)
    }
}

// =============================================================================
// Site Output
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory the materializer writes the runnable project into
    pub output_dir: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("generated_site"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = Config::default();
        config.pipeline.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_temperature_schedule_monotone_and_capped() {
        let policy = PipelineConfig::default();
        assert_eq!(policy.temperature_for_attempt(0), 0.3);
        assert!(policy.temperature_for_attempt(1) > policy.temperature_for_attempt(0));
        assert!(policy.temperature_for_attempt(100) <= policy.max_temperature);
    }

    #[test]
    fn test_inverted_temperature_bounds_rejected() {
        let mut config = Config::default();
        config.pipeline.max_temperature = 0.1;
        assert!(config.validate().is_err());
    }
}
