//! LLM Provider Abstraction
//!
//! Defines the LlmProvider trait for raw text generation. Providers return
//! the model's output untouched; extracting structured data from it is the
//! pipeline's job (see [`crate::ai::recovery`]). Nothing here assumes the
//! call is deterministic, idempotent, or bounded in latency.

mod ollama;
mod openai;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::types::Result;

/// Shared LLM provider handle, injected into the pipeline at construction.
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Generation Request
// =============================================================================

/// One generative call.
///
/// Temperature is per-request: the stage runner raises it across retries,
/// so providers must not cache or override it.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    /// Role/system framing for the model
    pub system_prompt: &'a str,
    /// Task prompt with upstream data inlined
    pub user_prompt: &'a str,
    /// Sampling temperature for this call
    pub temperature: f32,
    /// Output token cap for this call
    pub max_output_tokens: usize,
}

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for LLM providers
///
/// Note: API keys are handled securely - they are never serialized to
/// output and are redacted in debug output. Each provider converts the key
/// to SecretString internally for runtime protection.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type: "openai", "ollama"
    pub provider: String,
    /// Model name (provider-specific)
    pub model: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// API key (for OpenAI-compatible endpoints)
    /// Never serialized to output for security
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            timeout_secs: crate::constants::network::DEFAULT_TIMEOUT_SECS,
            api_key: None,
            api_base: None,
        }
    }
}

impl From<&LlmConfig> for ProviderConfig {
    fn from(llm: &LlmConfig) -> Self {
        Self {
            provider: llm.provider.clone(),
            model: llm.model.clone(),
            timeout_secs: llm.timeout_secs,
            api_key: None,
            api_base: llm.api_base.clone(),
        }
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// LLM Provider trait for raw text generation
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute one generative call and return the raw response text.
    ///
    /// The result is untrusted: it may be prose, fenced JSON, partial
    /// JSON, or anything else the model felt like producing.
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Check if the provider is available
    async fn health_check(&self) -> Result<bool>;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config.clone())?)),
        _ => Err(crate::types::PlatoError::Config(format!(
            "Unknown provider: {}. Supported: openai, ollama",
            config.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_debug_redacts_key() {
        let config = ProviderConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_create_provider_unknown() {
        let config = ProviderConfig {
            provider: "mystery".to_string(),
            ..Default::default()
        };
        assert!(create_provider(&config).is_err());
    }
}
