//! Ollama Local LLM Provider
//!
//! LLM provider for locally-running Ollama models. Returns the raw
//! completion text; JSON extraction happens downstream in the pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{GenerationRequest, LlmProvider, ProviderConfig};
use crate::types::{PlatoError, Result};

const DEFAULT_API_BASE: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3:latest";

/// Ollama Local LLM Provider
pub struct OllamaProvider {
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        // Validate endpoint URL for security (SSRF prevention)
        let api_base = Self::validate_endpoint(&api_base)?;

        let model = config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlatoError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base,
            model,
            client,
        })
    }

    /// Validate endpoint URL for security (SSRF prevention)
    ///
    /// Only allows http/https schemes and warns for non-localhost endpoints.
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            PlatoError::Config(format!("Invalid Ollama endpoint URL '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(PlatoError::Config(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "::1")
        {
            warn!(
                "Ollama endpoint is not localhost: {}. Ensure this is intentional.",
                host
            );
        }

        let mut result = url.to_string();
        if result.ends_with('/') {
            result.pop();
        }
        Ok(result)
    }

    fn build_request(&self, request: &GenerationRequest<'_>) -> OllamaRequest {
        OllamaRequest {
            model: self.model.clone(),
            system: request.system_prompt.to_string(),
            prompt: request.user_prompt.to_string(),
            stream: false,
            options: Some(OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_output_tokens,
            }),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        info!(
            "Generating with Ollama (model: {}, temperature: {})",
            self.model, request.temperature
        );

        let body = self.build_request(request);
        let url = format!("{}/api/generate", self.api_base);

        debug!("Sending request to Ollama API");

        let response = self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    PlatoError::LlmApi(format!(
                        "Failed to connect to Ollama at {}. Is Ollama running? Start with: ollama serve",
                        self.api_base
                    ))
                } else {
                    PlatoError::LlmApi(format!("Ollama request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PlatoError::LlmApi(format!(
                "Ollama API error ({}): {}",
                status, body
            )));
        }

        let response_body: OllamaResponse = response
            .json()
            .await
            .map_err(|e| PlatoError::LlmApi(format!("Failed to parse Ollama response: {}", e)))?;

        debug!("Received {} chars from Ollama", response_body.response.len());
        Ok(response_body.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.api_base);

        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("Ollama is available");
                Ok(true)
            }
            Ok(resp) => {
                warn!("Ollama check failed: {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Ollama check failed: {}", e);
                Ok(false)
            }
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    system: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_endpoint_accepts_localhost() {
        let result = OllamaProvider::validate_endpoint("http://localhost:11434");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_endpoint_rejects_file_scheme() {
        let result = OllamaProvider::validate_endpoint("file:///etc/passwd");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_endpoint_strips_trailing_slash() {
        let result = OllamaProvider::validate_endpoint("http://localhost:11434/").unwrap();
        assert!(!result.ends_with('/'));
    }
}
