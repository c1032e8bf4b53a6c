use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use analytics_cell::router::dashboard_routes;
use appointment_cell::router::{appointment_routes, psychologist_routes};
use auth_cell::router::auth_routes;
use chatbot_cell::router::chatbot_routes;
use mood_cell::router::mood_routes;
use payment_cell::router::{payment_routes, webhook_routes};
use shared_config::AppConfig;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "serenio-api" }))
}

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Serenio API is running!" }))
        .route("/health", get(health))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/psychologists", psychologist_routes(state.clone()))
        .nest("/mood", mood_routes(state.clone()))
        .nest("/dashboard", dashboard_routes(state.clone()))
        .nest("/chatbot", chatbot_routes(state.clone()))
        .nest("/payment", payment_routes(state.clone()))
        .nest("/webhook", webhook_routes(state))
}
