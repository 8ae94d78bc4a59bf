use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{ConsultationLocation, LocationError, LocationFilters, TogglePublishRequest};
use crate::services::listing::derive_filter_options;
use crate::services::LocationService;

fn practitioner_id(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Invalid user identity in token".to_string()))
}

fn map_location_error(e: LocationError) -> AppError {
    match e {
        LocationError::Validation(message) => AppError::ValidationError(message),
        LocationError::NotFound => AppError::NotFound("Consultation location not found".to_string()),
        LocationError::Persistence(e) => AppError::Internal(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn list_locations(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(filters): Query<LocationFilters>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let practitioner_id = practitioner_id(&user)?;

    let location_service = LocationService::new(&state);

    let locations = location_service
        .list_locations(practitioner_id, &filters, token)
        .await
        .map_err(map_location_error)?;

    let filter_options = derive_filter_options(&locations);

    Ok(Json(json!({
        "locations": locations,
        "filter_options": filter_options,
        "total": locations.len()
    })))
}

#[axum::debug_handler]
pub async fn create_location(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<ConsultationLocation>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let practitioner_id = practitioner_id(&user)?;

    let location_service = LocationService::new(&state);

    let location = location_service
        .create_location(practitioner_id, request, token)
        .await
        .map_err(map_location_error)?;

    Ok(Json(json!(location)))
}

#[axum::debug_handler]
pub async fn update_location(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(location_id): Path<Uuid>,
    Json(request): Json<ConsultationLocation>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let location_service = LocationService::new(&state);

    let location = location_service
        .update_location(location_id, request, token)
        .await
        .map_err(map_location_error)?;

    Ok(Json(json!(location)))
}

#[axum::debug_handler]
pub async fn delete_location(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(location_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let location_service = LocationService::new(&state);

    location_service
        .delete_location(location_id, token)
        .await
        .map_err(map_location_error)?;

    Ok(Json(json!({
        "deleted": true,
        "location_id": location_id
    })))
}

#[axum::debug_handler]
pub async fn toggle_publish(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(location_id): Path<Uuid>,
    Json(request): Json<TogglePublishRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let location_service = LocationService::new(&state);

    location_service
        .set_published(location_id, request.publish, token)
        .await
        .map_err(map_location_error)?;

    Ok(Json(json!({
        "location_id": location_id,
        "is_published": request.publish
    })))
}
