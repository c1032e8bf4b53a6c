use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn dashboard_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/mood/stats", get(handlers::get_mood_stats))
        .route("/mood/trends", get(handlers::get_mood_trends))
        .route("/user/stats", get(handlers::get_user_stats))
        .route("/user/reports", get(handlers::get_user_reports))
        .route("/sessions/analytics", get(handlers::get_session_analytics))
        .route("/wellness/insights", get(handlers::get_wellness_insights))
        .route("/activity/recent", get(handlers::get_recent_activity))
        .route("/psychologist/stats", get(handlers::get_psychologist_stats))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
