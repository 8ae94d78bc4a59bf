use serde::{Deserialize, Serialize};

/// One prescription or report image as it entered the pipeline, paired with
/// its original filename so page order stays auditable.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedImage {
    pub name: String,
    pub data: Vec<u8>,
}

/// A captured rendering of the manual prescription form, PNG-encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width_px: u32,
    pub height_px: u32,
    pub png_data: Vec<u8>,
}

/// Client-side capture of the manual prescription form. The capture itself
/// happens on the practitioner's screen; the server receives the PNG bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSnapshot {
    pub png_data: Vec<u8>,
}

/// Size budget applied to every uploaded image before it becomes a PDF page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionBudget {
    pub max_size_mb: f64,
    pub max_dimension_px: u32,
}

impl Default for CompressionBudget {
    fn default() -> Self {
        Self {
            max_size_mb: 0.5,
            max_dimension_px: 1920,
        }
    }
}

/// Capture settings the client is expected to honor when rendering the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureOptions {
    pub scale: f64,
    pub background_color: String,
    pub allow_cross_origin: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            scale: 1.5,
            background_color: "#ffffff".to_string(),
            allow_cross_origin: true,
        }
    }
}

/// Where a prescription document comes from. Exactly one variant exists per
/// submission; a record with both images and a form is unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactSource {
    UploadedImages(Vec<NamedImage>),
    RenderedForm(FormSnapshot),
}

/// In-progress source selection while the practitioner is still choosing.
///
/// Adding images while a form is open, or opening the form while images
/// exist, is a conflict. Removing the last image returns the draft to empty
/// and re-enables the form path.
#[derive(Debug, Clone, Default)]
pub struct ArtifactDraft {
    images: Vec<NamedImage>,
    form: Option<FormSnapshot>,
}

impl ArtifactDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(&self) -> &[NamedImage] {
        &self.images
    }

    pub fn has_form(&self) -> bool {
        self.form.is_some()
    }

    pub fn add_image(&mut self, image: NamedImage) -> Result<(), ArtifactError> {
        if self.form.is_some() {
            return Err(ArtifactError::SourceConflict);
        }
        self.images.push(image);
        Ok(())
    }

    pub fn remove_image(&mut self, index: usize) -> Option<NamedImage> {
        if index < self.images.len() {
            Some(self.images.remove(index))
        } else {
            None
        }
    }

    pub fn open_form(&mut self, snapshot: FormSnapshot) -> Result<(), ArtifactError> {
        if !self.images.is_empty() {
            return Err(ArtifactError::SourceConflict);
        }
        self.form = Some(snapshot);
        Ok(())
    }

    pub fn close_form(&mut self) -> Option<FormSnapshot> {
        self.form.take()
    }

    /// Seal the draft into the single source the pipeline accepts.
    pub fn into_source(self) -> Result<ArtifactSource, ArtifactError> {
        match (self.images.is_empty(), self.form) {
            (false, None) => Ok(ArtifactSource::UploadedImages(self.images)),
            (true, Some(snapshot)) => Ok(ArtifactSource::RenderedForm(snapshot)),
            (true, None) => Err(ArtifactError::EmptySource),
            // add_image/open_form reject the mixed state before it can exist
            (false, Some(_)) => Err(ArtifactError::SourceConflict),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Another prescription source is already in use")]
    SourceConflict,

    #[error("No prescription source was provided")]
    EmptySource,

    #[error("Image processing failed: {0}")]
    Image(String),

    #[error("Document composition failed: {0}")]
    Composition(String),

    #[error("Form capture could not be processed: {0}")]
    Rasterization(String),

    #[error("Artifact upload failed: {0}")]
    Upload(String),
}

// ==============================================================================
// REQUEST / RESPONSE TYPES
// ==============================================================================

/// One file as submitted over HTTP, content base64-encoded (data-URI prefixes
/// are tolerated and stripped).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedFile {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteConsultationRequest {
    #[serde(default)]
    pub prescription_images: Vec<EncodedFile>,
    #[serde(default)]
    pub prescription_form: Option<EncodedFile>,
    #[serde(default)]
    pub report_images: Vec<EncodedFile>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Artifact URIs persisted on the consultation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub consultation_id: uuid::Uuid,
    pub prescription_url: String,
    pub report_url: Option<String>,
}
