pub mod completion;
pub mod media;
pub mod pipeline;
pub mod storage;

pub use completion::{ConsultationError, ConsultationService};
pub use media::{JpegBudgetCompressor, PngSnapshotRasterizer, PrintPdfComposer};
pub use pipeline::{ArtifactPipeline, AssetStore, DocumentComposer, FormRasterizer, ImageCompressor};
pub use storage::SupabaseStorage;
