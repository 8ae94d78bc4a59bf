use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    ArtifactError, ArtifactSource, CaptureOptions, CompressionBudget, FormSnapshot, NamedImage,
    RasterImage,
};

// ==============================================================================
// COLLABORATOR SEAMS
// ==============================================================================

#[async_trait]
pub trait ImageCompressor: Send + Sync {
    async fn compress(
        &self,
        data: &[u8],
        budget: &CompressionBudget,
    ) -> Result<Vec<u8>, ArtifactError>;
}

#[async_trait]
pub trait DocumentComposer: Send + Sync {
    /// One full-page image per input, in input order.
    async fn merge_images(&self, images: &[NamedImage]) -> Result<Vec<u8>, ArtifactError>;

    /// Container-level compression pass over an already-merged document.
    async fn compact(&self, pdf: Vec<u8>) -> Result<Vec<u8>, ArtifactError>;

    /// Single page sized to the raster's aspect ratio at A4 width.
    async fn compose_raster(&self, raster: &RasterImage) -> Result<Vec<u8>, ArtifactError>;
}

#[async_trait]
pub trait FormRasterizer: Send + Sync {
    async fn capture(
        &self,
        snapshot: &FormSnapshot,
        options: &CaptureOptions,
    ) -> Result<RasterImage, ArtifactError>;
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(&self, data: Vec<u8>, destination_path: &str)
        -> Result<String, ArtifactError>;
}

// ==============================================================================
// DESTINATION PATHS
// ==============================================================================

pub fn prescription_path(practitioner_id: Uuid, consultation_id: Uuid) -> String {
    format!("{}/{}/prescription", practitioner_id, consultation_id)
}

pub fn report_path(practitioner_id: Uuid, consultation_id: Uuid) -> String {
    format!("{}/{}/report", practitioner_id, consultation_id)
}

// ==============================================================================
// PIPELINE
// ==============================================================================

/// Turns one prescription source into exactly one uploaded PDF.
///
/// Steps run strictly in sequence; each step's output is the next step's only
/// input. Any failure aborts the run, and nothing external is committed
/// before the single final upload.
pub struct ArtifactPipeline {
    compressor: Arc<dyn ImageCompressor>,
    composer: Arc<dyn DocumentComposer>,
    rasterizer: Arc<dyn FormRasterizer>,
    store: Arc<dyn AssetStore>,
    budget: CompressionBudget,
    capture_options: CaptureOptions,
}

impl ArtifactPipeline {
    pub fn new(
        compressor: Arc<dyn ImageCompressor>,
        composer: Arc<dyn DocumentComposer>,
        rasterizer: Arc<dyn FormRasterizer>,
        store: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            compressor,
            composer,
            rasterizer,
            store,
            budget: CompressionBudget::default(),
            capture_options: CaptureOptions::default(),
        }
    }

    /// Run the pipeline to completion and return the uploaded artifact's URI.
    pub async fn run(
        &self,
        source: ArtifactSource,
        destination_path: &str,
    ) -> Result<String, ArtifactError> {
        let pdf = match source {
            ArtifactSource::UploadedImages(images) => {
                debug!("Compressing {} image(s) for {}", images.len(), destination_path);

                let mut compressed = Vec::with_capacity(images.len());
                for image in &images {
                    let data = self.compressor.compress(&image.data, &self.budget).await?;
                    compressed.push(NamedImage {
                        name: image.name.clone(),
                        data,
                    });
                }

                let merged = self.composer.merge_images(&compressed).await?;
                self.composer.compact(merged).await?
            }
            ArtifactSource::RenderedForm(snapshot) => {
                debug!("Rasterizing form capture for {}", destination_path);

                let raster = self.rasterizer.capture(&snapshot, &self.capture_options).await?;
                self.composer.compose_raster(&raster).await?
            }
        };

        let uri = self.store.upload(pdf, destination_path).await?;
        debug!("Artifact uploaded to {}", uri);
        Ok(uri)
    }
}
