//! Generative-Model Boundary
//!
//! Provider abstraction, timeout wrapper, and the two repair layers that
//! make untrusted model output usable: JSON recovery and artifact
//! sanitation.

pub mod provider;
pub mod recovery;
pub mod sanitize;
pub mod timeout;

pub use provider::{
    GenerationRequest, LlmProvider, OllamaProvider, OpenAiProvider, ProviderConfig,
    SharedProvider, create_provider,
};
pub use recovery::{Recovered, RecoveryEngine};
pub use sanitize::ArtifactSanitizer;
pub use timeout::with_timeout;
