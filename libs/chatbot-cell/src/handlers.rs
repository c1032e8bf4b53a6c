use std::sync::Arc;

use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{AuthContext, Capability};
use shared_models::error::AppError;

use crate::models::ChatMessageRequest;
use crate::services::assistant::AssistantService;

#[axum::debug_handler]
pub async fn send_message(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<ChatMessageRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload?;
    ctx.require(Capability::UseAssistant)?;

    let reply = AssistantService::new(&state).reply(&ctx, request).await?;
    Ok(Json(json!(reply)))
}

#[axum::debug_handler]
pub async fn get_session_history(
    State(state): State<Arc<AppConfig>>,
    path: Result<Path<String>, PathRejection>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let Path(session_id) = path?;
    let exchanges = AssistantService::new(&state)
        .history(&ctx, &session_id)
        .await?;

    Ok(Json(json!({
        "session_id": session_id,
        "exchanges": exchanges,
        "total": exchanges.len()
    })))
}

#[axum::debug_handler]
pub async fn list_sessions(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let sessions = AssistantService::new(&state).sessions(&ctx).await?;
    Ok(Json(json!({ "sessions": sessions })))
}

pub async fn health(State(state): State<Arc<AppConfig>>) -> Json<Value> {
    Json(AssistantService::new(&state).health())
}
