use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Json, State},
    http::{HeaderMap, StatusCode},
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{AuthContext, TokenResponse};
use shared_models::error::AppError;
use shared_utils::extractor::bearer_token;
use shared_utils::jwt::validate_access_token;

use crate::models::{LoginRequest, RefreshRequest, RegisterRequest, UpdateProfileRequest};
use crate::services::accounts::AccountService;

pub async fn register(
    State(config): State<Arc<AppConfig>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload?;
    let response = AccountService::new(&config).register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "access_token": response.access_token,
            "refresh_token": response.refresh_token,
            "user": response.user
        })),
    ))
}

pub async fn login(
    State(config): State<Arc<AppConfig>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload?;
    let response = AccountService::new(&config).login(request).await?;

    Ok(Json(json!({
        "message": "Login successful",
        "access_token": response.access_token,
        "refresh_token": response.refresh_token,
        "user": response.user
    })))
}

pub async fn refresh(
    State(config): State<Arc<AppConfig>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload?;
    let response = AccountService::new(&config).refresh(&request.refresh_token).await?;

    Ok(Json(json!({
        "access_token": response.access_token,
        "refresh_token": response.refresh_token
    })))
}

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = bearer_token(&headers)?;
    let ctx = validate_access_token(&token, &config)
        .map_err(|e| AppError::Forbidden(e.to_string()))?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: ctx.user_id,
        email: ctx.email,
        role: ctx.role,
    }))
}

pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");

    let token = bearer_token(&headers)?;
    let valid = validate_access_token(&token, &config).is_ok();

    Ok(Json(json!({ "valid": valid })))
}

pub async fn me(
    State(config): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    debug!("Getting profile for user: {}", ctx.user_id);

    let account = AccountService::new(&config).profile(ctx.user_id).await?;

    Ok(Json(json!({
        "user": account,
        "session_expires_at": ctx.expires_at
    })))
}

pub async fn update_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload?;
    let account = AccountService::new(&config).update_profile(&ctx, request).await?;

    Ok(Json(json!({
        "message": "Profile updated",
        "user": account
    })))
}

pub async fn delete_account(
    State(config): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    AccountService::new(&config).delete_account(ctx.user_id).await?;
    Ok(Json(json!({ "message": "Account deleted" })))
}
