use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{ConsultationLocation, FilterOptions, LocationError};

/// Remote side of the publish toggle. Implemented by `LocationService` in
/// production and mocked in tests.
#[async_trait]
pub trait PublishBackend: Send + Sync {
    async fn set_published(&self, location_id: Uuid, publish: bool) -> anyhow::Result<()>;
}

/// Derive the dashboard filter option sets from a fetched page of locations.
/// Types appear in first-seen order, deduplicated.
pub fn derive_filter_options(locations: &[ConsultationLocation]) -> FilterOptions {
    let mut location_types: Vec<String> = Vec::new();
    for location in locations {
        if !location.location_type.is_empty()
            && !location_types.contains(&location.location_type)
        {
            location_types.push(location.location_type.clone());
        }
    }

    FilterOptions {
        location_types,
        total_locations: locations.len(),
    }
}

/// In-memory state behind the dashboard list view.
///
/// Filter options are seeded from the first successful fetch only; later
/// fetches replace the rows but leave the options as they were, so filtering
/// down the list does not shrink its own dropdowns.
#[derive(Debug, Default)]
pub struct DashboardListing {
    locations: Vec<ConsultationLocation>,
    filter_options: Option<FilterOptions>,
}

impl DashboardListing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locations(&self) -> &[ConsultationLocation] {
        &self.locations
    }

    pub fn filter_options(&self) -> Option<&FilterOptions> {
        self.filter_options.as_ref()
    }

    /// Replace the rows with a freshly fetched page.
    pub fn absorb_fetch(&mut self, rows: Vec<ConsultationLocation>) {
        if self.filter_options.is_none() {
            self.filter_options = Some(derive_filter_options(&rows));
        }
        self.locations = rows;
    }

    fn flip_published(&mut self, location_id: Uuid, publish: bool) -> Option<bool> {
        let location = self
            .locations
            .iter_mut()
            .find(|location| location.id == Some(location_id))?;
        let previous = location.is_published;
        location.is_published = publish;
        Some(previous)
    }

    /// Publish or unpublish a listed location.
    ///
    /// The local row is flipped immediately so the view reflects the intent,
    /// then the backend call confirms it; on failure the flip is rolled back
    /// and the error surfaces to the caller.
    pub async fn toggle_published<B: PublishBackend + ?Sized>(
        &mut self,
        location_id: Uuid,
        publish: bool,
        backend: &B,
    ) -> Result<(), LocationError> {
        let previous = self
            .flip_published(location_id, publish)
            .ok_or(LocationError::NotFound)?;

        match backend.set_published(location_id, publish).await {
            Ok(()) => {
                debug!("Publish toggle confirmed for location {}", location_id);
                Ok(())
            }
            Err(e) => {
                warn!("Publish toggle failed for location {}, rolling back: {}", location_id, e);
                self.flip_published(location_id, previous);
                Err(LocationError::Persistence(e))
            }
        }
    }
}
