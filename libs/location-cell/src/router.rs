use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn location_routes(state: Arc<AppConfig>) -> Router {
    // Every location route acts on the authenticated practitioner's own data
    let protected_routes = Router::new()
        .route("/", get(handlers::list_locations))
        .route("/", post(handlers::create_location))
        .route("/{location_id}", put(handlers::update_location))
        .route("/{location_id}", delete(handlers::delete_location))
        .route("/{location_id}/publish", patch(handlers::toggle_publish))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
