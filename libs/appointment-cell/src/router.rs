// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/book", post(handlers::book_appointment))
        .route("/available-slots", get(handlers::get_available_slots))
        .route("/my", get(handlers::get_my_appointments))
        .route("/provider", get(handlers::get_provider_appointments))
        .route("/cancel/{appointment_id}", put(handlers::cancel_appointment))
        .route("/complete/{appointment_id}", put(handlers::complete_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}

/// Psychologist directory and the provider's client list.
pub fn psychologist_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_psychologists))
        .route("/clients", get(handlers::get_my_clients))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
