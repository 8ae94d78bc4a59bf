use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use consultation_cell::router::consultation_routes;
use location_cell::router::location_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Practice Dashboard API is running!" }))
        .nest("/locations", location_routes(state.clone()))
        .nest("/consultations", consultation_routes(state.clone()))
}
