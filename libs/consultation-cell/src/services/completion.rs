use anyhow::anyhow;
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{ArtifactError, ArtifactSource, CompletionOutcome, NamedImage};
use crate::services::pipeline::{self, ArtifactPipeline};

#[derive(Debug, thiserror::Error)]
pub enum ConsultationError {
    #[error("{0}")]
    Artifact(#[from] ArtifactError),

    #[error("Consultation not found")]
    NotFound,

    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

pub struct ConsultationService {
    supabase: SupabaseClient,
}

impl ConsultationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Finish a consultation: produce and upload its artifacts, then write
    /// the resulting URIs onto the consultation record.
    ///
    /// The prescription artifact is mandatory and any failure there aborts
    /// the whole submission before the record is touched. The report
    /// artifact is attempted only when report images were supplied, and its
    /// failure is tolerated; the record then proceeds with no report URI.
    pub async fn complete_consultation(
        &self,
        pipeline: &ArtifactPipeline,
        practitioner_id: Uuid,
        consultation_id: Uuid,
        prescription: ArtifactSource,
        report_images: Vec<NamedImage>,
        notes: Option<String>,
        auth_token: &str,
    ) -> Result<CompletionOutcome, ConsultationError> {
        debug!("Completing consultation {}", consultation_id);

        let prescription_url = pipeline
            .run(
                prescription,
                &pipeline::prescription_path(practitioner_id, consultation_id),
            )
            .await?;

        let report_url = if report_images.is_empty() {
            None
        } else {
            let result = pipeline
                .run(
                    ArtifactSource::UploadedImages(report_images),
                    &pipeline::report_path(practitioner_id, consultation_id),
                )
                .await;

            match result {
                Ok(uri) => Some(uri),
                Err(e) => {
                    warn!(
                        "Report upload failed for consultation {}, completing without it: {}",
                        consultation_id, e
                    );
                    None
                }
            }
        };

        self.persist_completion(
            consultation_id,
            &prescription_url,
            report_url.as_deref(),
            notes.as_deref(),
            auth_token,
        )
        .await?;

        Ok(CompletionOutcome {
            consultation_id,
            prescription_url,
            report_url,
        })
    }

    async fn persist_completion(
        &self,
        consultation_id: Uuid,
        prescription_url: &str,
        report_url: Option<&str>,
        notes: Option<&str>,
        auth_token: &str,
    ) -> Result<(), ConsultationError> {
        let path = format!("/rest/v1/consultations?id=eq.{}", consultation_id);
        let body = json!({
            "status": "completed",
            "prescription_url": prescription_url,
            "report_url": report_url,
            "notes": notes,
            "completed_at": Utc::now().to_rfc3339(),
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(body), Some(headers))
            .await
            .map_err(|e| ConsultationError::Persistence(anyhow!("{}", e)))?;

        if updated.is_empty() {
            return Err(ConsultationError::NotFound);
        }

        debug!("Consultation {} marked completed", consultation_id);
        Ok(())
    }
}
