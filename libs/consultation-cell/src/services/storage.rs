use async_trait::async_trait;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::ArtifactError;
use crate::services::pipeline::AssetStore;

/// Artifact store backed by Supabase storage. Holds the caller's token so
/// uploads run under the practitioner's own session.
pub struct SupabaseStorage {
    supabase: SupabaseClient,
    bucket: String,
    auth_token: String,
}

impl SupabaseStorage {
    pub fn new(config: &AppConfig, auth_token: &str) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            bucket: config.artifact_bucket.clone(),
            auth_token: auth_token.to_string(),
        }
    }
}

#[async_trait]
impl AssetStore for SupabaseStorage {
    async fn upload(
        &self,
        data: Vec<u8>,
        destination_path: &str,
    ) -> Result<String, ArtifactError> {
        debug!(
            "Uploading {} bytes to {}/{}",
            data.len(),
            self.bucket,
            destination_path
        );

        self.supabase
            .upload_object(
                &self.bucket,
                destination_path,
                data,
                "application/pdf",
                &self.auth_token,
            )
            .await
            .map_err(|e| ArtifactError::Upload(e.to_string()))?;

        Ok(self.supabase.get_public_url(&self.bucket, destination_path))
    }
}
