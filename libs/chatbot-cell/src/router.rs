use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn chatbot_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health));

    let protected_routes = Router::new()
        .route("/message", post(handlers::send_message))
        .route("/sessions", get(handlers::list_sessions))
        .route("/history/{session_id}", get(handlers::get_session_history))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
