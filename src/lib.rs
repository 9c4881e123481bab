//! Platogen - AI-Driven Single-Page Portfolio Site Generator
//!
//! A multi-stage content/design pipeline that turns unstructured
//! personal/professional text, questionnaire answers, and three "vibe"
//! inputs into a generated single-page website, then materializes it as a
//! runnable project directory.
//!
//! ## Core Ideas
//!
//! - **Recovery over rejection**: every generative stage coerces
//!   untrusted, frequently malformed model output into schema-conformant
//!   data through an ordered-strategy recovery engine and structural
//!   auto-correction, retrying at rising temperature and degrading to a
//!   static fallback rather than ever failing.
//! - **Sequential orchestration**: stages run one at a time in dependency
//!   order over a shared workspace with an append-only action log; a
//!   consistency reviewer cross-checks the finished workspace and may
//!   trigger one bounded stage re-run.
//! - **Determinism where it's cheap**: the visual mood system is a pure
//!   hash-indexed catalog lookup, not a generative call.
//!
//! ## Quick Start
//!
//! ```ignore
//! use platogen::{Config, PipelineInput, PipelineOrchestrator};
//! use platogen::ai::{ProviderConfig, create_provider};
//! use platogen::pipeline::{DiskMaterializer, Materializer};
//!
//! let config = Config::default();
//! let provider = create_provider(&ProviderConfig::from(&config.llm))?;
//! let orchestrator = PipelineOrchestrator::new(provider, &config);
//!
//! let outcome = orchestrator.run(&input).await;
//! let materializer = DiskMaterializer::new(&config.site.output_dir);
//! materializer.materialize(
//!     outcome.workspace.artifact_html().unwrap_or_default(),
//!     &outcome.workspace.structured_data(),
//!     &input.media_files,
//! )?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: LLM provider abstraction, output recovery, artifact sanitation
//! - [`schema`]: declarative stage schemas with default-filling validation
//! - [`pipeline`]: orchestrator, stage runner, stages, reviewer, materializer
//! - [`config`]: layered TOML + env configuration

pub mod ai;
pub mod config;
pub mod constants;
pub mod pipeline;
pub mod schema;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};
pub use types::{PlatoError, Result, SchemaError};

pub use pipeline::{
    DiskMaterializer, Materializer, PipelineInput, PipelineOrchestrator, PipelineOutcome,
    StageId, Workspace,
};

pub use ai::{LlmProvider, ProviderConfig, RecoveryEngine, SharedProvider, create_provider};
