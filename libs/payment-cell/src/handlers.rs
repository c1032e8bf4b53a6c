use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Extension, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use shared_config::AppConfig;
use shared_models::auth::{AuthContext, Capability};
use shared_models::error::AppError;

use crate::models::CreatePaymentIntentRequest;
use crate::services::ledger::PaymentService;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[axum::debug_handler]
pub async fn create_payment_intent(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<CreatePaymentIntentRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload?;
    ctx.require(Capability::MakePayment)?;

    let intent = PaymentService::new(&state).create_intent(&ctx, request).await?;
    Ok(Json(json!(intent)))
}

#[axum::debug_handler]
pub async fn get_payment_history(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let payments = PaymentService::new(&state).history(&ctx).await?;

    Ok(Json(json!({
        "payments": payments,
        "total": payments.len()
    })))
}

/// Processor callback. Takes the raw body because the signature covers
/// the exact bytes sent.
#[axum::debug_handler]
pub async fn stripe_webhook(
    State(state): State<Arc<AppConfig>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    PaymentService::new(&state)
        .handle_webhook(&body, signature, Utc::now().timestamp())
        .await
        .map_err(|e| {
            warn!("Rejected webhook: {}", e);
            AppError::from(e)
        })?;

    Ok(Json(json!({ "received": true })))
}
