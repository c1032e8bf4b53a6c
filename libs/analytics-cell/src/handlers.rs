use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::{AuthContext, Capability};
use shared_models::error::AppError;

use crate::services::dashboard::DashboardService;

#[axum::debug_handler]
pub async fn get_mood_stats(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    ctx.require(Capability::ViewOwnAnalytics)?;
    let stats = DashboardService::new(&state).mood_stats(&ctx, Utc::now()).await?;
    Ok(Json(json!(stats)))
}

#[axum::debug_handler]
pub async fn get_user_stats(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    ctx.require(Capability::ViewOwnAnalytics)?;
    let stats = DashboardService::new(&state).user_stats(&ctx, Utc::now()).await?;
    Ok(Json(json!(stats)))
}

#[axum::debug_handler]
pub async fn get_mood_trends(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    ctx.require(Capability::ViewOwnAnalytics)?;
    let trends = DashboardService::new(&state).mood_trends(&ctx, Utc::now()).await?;
    Ok(Json(json!(trends)))
}

#[axum::debug_handler]
pub async fn get_session_analytics(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    ctx.require(Capability::ViewOwnAnalytics)?;
    let sessions = DashboardService::new(&state).session_analytics(&ctx, Utc::now()).await?;
    Ok(Json(json!(sessions)))
}

#[axum::debug_handler]
pub async fn get_wellness_insights(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    ctx.require(Capability::ViewOwnAnalytics)?;
    let insights = DashboardService::new(&state).wellness_insights(&ctx, Utc::now()).await?;
    Ok(Json(json!(insights)))
}

#[axum::debug_handler]
pub async fn get_user_reports(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    ctx.require(Capability::ViewOwnAnalytics)?;
    let report = DashboardService::new(&state).user_report(&ctx, Utc::now()).await?;
    Ok(Json(json!(report)))
}

#[axum::debug_handler]
pub async fn get_recent_activity(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    ctx.require(Capability::ViewOwnAnalytics)?;
    let activity = DashboardService::new(&state).recent_activity(&ctx).await?;
    Ok(Json(json!(activity)))
}

#[axum::debug_handler]
pub async fn get_psychologist_stats(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    ctx.require(Capability::ViewProviderStats)?;
    let stats = DashboardService::new(&state).provider_stats(&ctx, Utc::now()).await?;
    Ok(Json(json!(stats)))
}
