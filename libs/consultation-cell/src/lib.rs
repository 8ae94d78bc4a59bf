pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

// Re-export the core types for external use
pub use models::{
    ArtifactDraft, ArtifactError, ArtifactSource, CaptureOptions, CompressionBudget,
    FormSnapshot, NamedImage, RasterImage,
};
pub use services::{ArtifactPipeline, ConsultationService};
