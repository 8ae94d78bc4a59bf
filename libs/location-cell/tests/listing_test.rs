// libs/location-cell/tests/listing_test.rs
//
// Dashboard listing state tests: filter option seeding and the optimistic
// publish toggle with rollback.

use anyhow::anyhow;
use assert_matches::assert_matches;
use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::eq;
use uuid::Uuid;

use location_cell::models::{ConsultationLocation, LocationError};
use location_cell::services::listing::PublishBackend;
use location_cell::services::schedule;
use location_cell::DashboardListing;

mock! {
    Backend {}

    #[async_trait]
    impl PublishBackend for Backend {
        async fn set_published(&self, location_id: Uuid, publish: bool) -> anyhow::Result<()>;
    }
}

fn listed_location(name: &str, location_type: &str, published: bool) -> ConsultationLocation {
    let mut location = schedule::initialize(None);
    location.id = Some(Uuid::new_v4());
    location.location_name = name.to_string();
    location.location_type = location_type.to_string();
    location.is_published = published;
    location
}

#[tokio::test]
async fn absorb_fetch_replaces_rows() {
    let mut listing = DashboardListing::new();
    assert!(listing.locations().is_empty());

    listing.absorb_fetch(vec![
        listed_location("Apollo Hospital", "Hospital", true),
        listed_location("Green Clinic", "Clinic", false),
    ]);
    assert_eq!(listing.locations().len(), 2);

    listing.absorb_fetch(vec![listed_location("Green Clinic", "Clinic", false)]);
    assert_eq!(listing.locations().len(), 1);
}

#[tokio::test]
async fn filter_options_are_seeded_from_first_fetch_only() {
    let mut listing = DashboardListing::new();

    listing.absorb_fetch(vec![
        listed_location("Apollo Hospital", "Hospital", true),
        listed_location("City Hospital", "Hospital", true),
        listed_location("Green Clinic", "Clinic", false),
    ]);

    let options = listing.filter_options().expect("options after first fetch");
    assert_eq!(options.location_types, vec!["Hospital", "Clinic"]);
    assert_eq!(options.total_locations, 3);

    // A filtered re-fetch must not shrink the dropdowns it feeds
    listing.absorb_fetch(vec![listed_location("Green Clinic", "Clinic", false)]);

    let options = listing.filter_options().expect("options survive re-fetch");
    assert_eq!(options.location_types, vec!["Hospital", "Clinic"]);
    assert_eq!(options.total_locations, 3);
}

#[tokio::test]
async fn toggle_published_flips_row_and_confirms_with_backend() {
    let location = listed_location("Apollo Hospital", "Hospital", false);
    let location_id = location.id.unwrap();

    let mut listing = DashboardListing::new();
    listing.absorb_fetch(vec![location]);

    let mut backend = MockBackend::new();
    backend
        .expect_set_published()
        .with(eq(location_id), eq(true))
        .times(1)
        .returning(|_, _| Ok(()));

    listing
        .toggle_published(location_id, true, &backend)
        .await
        .expect("toggle should succeed");

    assert!(listing.locations()[0].is_published);
}

#[tokio::test]
async fn toggle_published_rolls_back_on_backend_failure() {
    let location = listed_location("Apollo Hospital", "Hospital", false);
    let location_id = location.id.unwrap();

    let mut listing = DashboardListing::new();
    listing.absorb_fetch(vec![location]);

    let mut backend = MockBackend::new();
    backend
        .expect_set_published()
        .times(1)
        .returning(|_, _| Err(anyhow!("upstream rejected the update")));

    let result = listing.toggle_published(location_id, true, &backend).await;

    assert_matches!(result, Err(LocationError::Persistence(_)));
    assert!(!listing.locations()[0].is_published);
}

#[tokio::test]
async fn toggle_published_on_unknown_row_is_not_found() {
    let mut listing = DashboardListing::new();
    listing.absorb_fetch(vec![listed_location("Apollo Hospital", "Hospital", false)]);

    let mut backend = MockBackend::new();
    backend.expect_set_published().times(0);

    let result = listing
        .toggle_published(Uuid::new_v4(), true, &backend)
        .await;

    assert_matches!(result, Err(LocationError::NotFound));
}
