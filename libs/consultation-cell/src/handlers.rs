use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    ArtifactDraft, ArtifactError, ArtifactSource, CompleteConsultationRequest, EncodedFile,
    FormSnapshot, NamedImage,
};
use crate::services::{
    ArtifactPipeline, ConsultationError, ConsultationService, JpegBudgetCompressor,
    PngSnapshotRasterizer, PrintPdfComposer, SupabaseStorage,
};

fn decode_file(file: &EncodedFile) -> Result<NamedImage, AppError> {
    // Tolerate data-URI payloads from the dashboard
    let content = if file.content.contains(";base64,") {
        file.content.split(";base64,").nth(1).unwrap_or(&file.content)
    } else {
        &file.content
    };

    let data = BASE64
        .decode(content.trim())
        .map_err(|e| AppError::BadRequest(format!("Failed to decode {}: {}", file.name, e)))?;

    Ok(NamedImage {
        name: file.name.clone(),
        data,
    })
}

fn build_prescription_source(
    request: &CompleteConsultationRequest,
) -> Result<ArtifactSource, AppError> {
    let mut draft = ArtifactDraft::new();

    for file in &request.prescription_images {
        draft
            .add_image(decode_file(file)?)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
    }

    if let Some(form) = &request.prescription_form {
        let decoded = decode_file(form)?;
        draft
            .open_form(FormSnapshot { png_data: decoded.data })
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
    }

    draft
        .into_source()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

fn map_consultation_error(e: ConsultationError) -> AppError {
    match e {
        ConsultationError::Artifact(
            artifact @ (ArtifactError::SourceConflict | ArtifactError::EmptySource),
        ) => AppError::BadRequest(artifact.to_string()),
        ConsultationError::Artifact(ArtifactError::Upload(message)) => {
            AppError::ExternalService(message)
        }
        ConsultationError::Artifact(artifact) => AppError::Internal(artifact.to_string()),
        ConsultationError::NotFound => AppError::NotFound("Consultation not found".to_string()),
        ConsultationError::Persistence(e) => AppError::Internal(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn complete_consultation(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(consultation_id): Path<Uuid>,
    Json(request): Json<CompleteConsultationRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let practitioner_id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Invalid user identity in token".to_string()))?;

    let prescription = build_prescription_source(&request)?;

    let report_images = request
        .report_images
        .iter()
        .map(decode_file)
        .collect::<Result<Vec<NamedImage>, AppError>>()?;

    let pipeline = ArtifactPipeline::new(
        Arc::new(JpegBudgetCompressor),
        Arc::new(PrintPdfComposer),
        Arc::new(PngSnapshotRasterizer),
        Arc::new(SupabaseStorage::new(&state, token)),
    );

    let consultation_service = ConsultationService::new(&state);

    let outcome = consultation_service
        .complete_consultation(
            &pipeline,
            practitioner_id,
            consultation_id,
            prescription,
            report_images,
            request.notes.clone(),
            token,
        )
        .await
        .map_err(map_consultation_error)?;

    Ok(Json(json!(outcome)))
}
