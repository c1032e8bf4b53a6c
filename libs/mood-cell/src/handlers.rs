use std::sync::Arc;

use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Extension, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{AuthContext, Capability};
use shared_models::error::AppError;

use crate::models::{LogMoodRequest, MoodHistoryQuery};
use crate::services::mood::MoodService;

#[axum::debug_handler]
pub async fn log_mood(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<LogMoodRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload?;
    ctx.require(Capability::LogMood)?;

    let entry = MoodService::new(&state)
        .log(&ctx, request.sentiment.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Mood logged successfully",
            "entry": entry
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_mood_history(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    query_params: Result<Query<MoodHistoryQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query_params?;
    let days = query.window_days();
    let entries = MoodService::new(&state)
        .history(&ctx, days, Utc::now())
        .await?;

    Ok(Json(json!({
        "days": days,
        "entries": entries,
        "total": entries.len()
    })))
}
