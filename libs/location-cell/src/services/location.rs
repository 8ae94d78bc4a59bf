use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{ConsultationLocation, LocationError, LocationFilters};
use crate::services::listing::PublishBackend;
use crate::services::{schedule, validation};

pub struct LocationService {
    supabase: SupabaseClient,
}

impl LocationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Create a consultation location. The record is validated first; an
    /// invalid record never reaches the persistence API.
    pub async fn create_location(
        &self,
        practitioner_id: Uuid,
        location: ConsultationLocation,
        auth_token: &str,
    ) -> Result<ConsultationLocation, LocationError> {
        debug!("Creating consultation location for practitioner {}", practitioner_id);

        // Client payloads may carry a partial week; stored records always
        // hold the full 7-day template
        let mut location = schedule::initialize(Some(&location));

        let outcome = validation::validate(&location);
        if let Some(error) = outcome.first_error() {
            return Err(LocationError::Validation(error.to_string()));
        }

        location.practitioner_id = Some(practitioner_id);

        let body = json!({
            "practitioner_id": practitioner_id,
            "location_name": location.location_name.trim(),
            "address": location.address.trim(),
            "location_type": location.location_type,
            "room_number": location.room_number,
            "consultation_fee": location.consultation_fee,
            "active_days": location.active_days,
            "is_published": location.is_published,
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/consultation_locations",
            Some(auth_token),
            Some(body),
            Some(headers),
        ).await?;

        let created = result
            .into_iter()
            .next()
            .ok_or_else(|| LocationError::Persistence(anyhow!("Failed to create consultation location")))?;

        let created: ConsultationLocation = serde_json::from_value(created)
            .map_err(|e| LocationError::Persistence(anyhow!("Failed to parse created location: {}", e)))?;

        debug!("Consultation location created with ID: {:?}", created.id);
        Ok(created)
    }

    /// Update an existing location. Validated the same way as create.
    pub async fn update_location(
        &self,
        location_id: Uuid,
        location: ConsultationLocation,
        auth_token: &str,
    ) -> Result<ConsultationLocation, LocationError> {
        debug!("Updating consultation location: {}", location_id);

        let location = schedule::initialize(Some(&location));

        let outcome = validation::validate(&location);
        if let Some(error) = outcome.first_error() {
            return Err(LocationError::Validation(error.to_string()));
        }

        let body = json!({
            "location_name": location.location_name.trim(),
            "address": location.address.trim(),
            "location_type": location.location_type,
            "room_number": location.room_number,
            "consultation_fee": location.consultation_fee,
            "active_days": location.active_days,
        });

        let path = format!("/rest/v1/consultation_locations?id=eq.{}", location_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(body),
            Some(headers),
        ).await?;

        let updated = result.into_iter().next().ok_or(LocationError::NotFound)?;

        let updated: ConsultationLocation = serde_json::from_value(updated)
            .map_err(|e| LocationError::Persistence(anyhow!("Failed to parse updated location: {}", e)))?;

        Ok(updated)
    }

    /// Delete a location by id. There is no soft-delete state.
    pub async fn delete_location(
        &self,
        location_id: Uuid,
        auth_token: &str,
    ) -> Result<(), LocationError> {
        debug!("Deleting consultation location: {}", location_id);

        let path = format!("/rest/v1/consultation_locations?id=eq.{}", location_id);
        let _: Vec<Value> = self.supabase.request(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(())
    }

    /// List a practitioner's locations, optionally filtered.
    pub async fn list_locations(
        &self,
        practitioner_id: Uuid,
        filters: &LocationFilters,
        auth_token: &str,
    ) -> Result<Vec<ConsultationLocation>, LocationError> {
        debug!("Listing consultation locations for practitioner {}", practitioner_id);

        let mut query_parts = vec![format!("practitioner_id=eq.{}", practitioner_id)];

        if let Some(ref location_type) = filters.location_type {
            query_parts.push(format!("location_type=eq.{}", location_type));
        }
        if let Some(published) = filters.published {
            query_parts.push(format!("is_published=eq.{}", published));
        }

        let path = format!(
            "/rest/v1/consultation_locations?{}&order=location_name.asc",
            query_parts.join("&")
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        let locations: Vec<ConsultationLocation> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ConsultationLocation>, _>>()
            .map_err(|e| LocationError::Persistence(anyhow!("Failed to parse locations: {}", e)))?;

        Ok(locations)
    }

    /// Flip the publish visibility of a saved location. This touches the one
    /// boolean only; the rest of the record is left as persisted.
    pub async fn set_published(
        &self,
        location_id: Uuid,
        publish: bool,
        auth_token: &str,
    ) -> Result<(), LocationError> {
        debug!("Setting is_published={} for location {}", publish, location_id);

        let path = format!("/rest/v1/consultation_locations?id=eq.{}", location_id);
        let body = json!({ "is_published": publish });

        let _: Vec<Value> = self.supabase.request(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(body),
        ).await?;

        Ok(())
    }

    /// Bind a caller's token to this service so it can stand in as the
    /// [`PublishBackend`] for a dashboard listing.
    pub fn publisher<'a>(&'a self, auth_token: &'a str) -> AuthorizedPublisher<'a> {
        AuthorizedPublisher {
            service: self,
            auth_token,
        }
    }
}

pub struct AuthorizedPublisher<'a> {
    service: &'a LocationService,
    auth_token: &'a str,
}

#[async_trait]
impl PublishBackend for AuthorizedPublisher<'_> {
    async fn set_published(&self, location_id: Uuid, publish: bool) -> anyhow::Result<()> {
        self.service
            .set_published(location_id, publish, self.auth_token)
            .await
            .map_err(|e| anyhow!("{}", e))
    }
}
