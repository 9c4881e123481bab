//! Pipeline Stages
//!
//! One module per stage plus shared schema and prompt providers. The mood
//! stage is a pure function; the rest implement
//! [`crate::pipeline::runner::PipelineStage`] and run through the generic
//! stage runner.

pub mod codegen;
pub mod content;
pub mod design;
pub mod icons;
pub mod layout;
pub mod mood;
pub mod prompts;
pub mod schemas;

pub use codegen::CodegenStage;
pub use content::ContentStage;
pub use design::DesignStage;
pub use icons::IconsStage;
pub use layout::LayoutStage;
pub use schemas::StageSchemas;
