use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, patch},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn professional_routes(state: Arc<AppConfig>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/search", get(handlers::search_professionals))
        .route("/specialties", get(handlers::get_specialties))
        .route("/{professional_id}", get(handlers::get_professional_public))
        .route("/{professional_id}/availability", get(handlers::get_availability_public))
        .route("/{professional_id}/available-slots", get(handlers::get_available_slots_public));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/availability", post(handlers::create_availability))
        .route("/availability/my", get(handlers::get_my_availability))
        .route(
            "/availability/{window_id}",
            patch(handlers::update_availability).delete(handlers::delete_availability),
        )
        .route("/{professional_id}/slot-duration", patch(handlers::update_slot_duration))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
