use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn mood_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/log", post(handlers::log_mood))
        .route("/history", get(handlers::get_mood_history))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
