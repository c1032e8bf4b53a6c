use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn payment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/create-payment-intent", post(handlers::create_payment_intent))
        .route("/history", get(handlers::get_payment_history))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Unauthenticated; requests are trusted only after signature checks.
pub fn webhook_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/stripe", post(handlers::stripe_webhook))
        .with_state(state)
}
