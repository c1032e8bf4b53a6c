// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthContext, Capability};
use shared_models::error::AppError;

use crate::models::{AvailableSlotsQuery, BookAppointmentRequest};
use crate::services::booking::AppointmentBookingService;
use crate::services::directory::ProviderDirectory;

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload?;
    ctx.require(Capability::BookAppointment)?;

    let appointment = AppointmentBookingService::new(&state).book(&ctx, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Appointment booked successfully",
            "appointment": appointment
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    query_params: Result<Query<AvailableSlotsQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query_params?;
    let slots = AppointmentBookingService::new(&state).available_slots(query).await?;
    Ok(Json(json!(slots)))
}

#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let appointments = AppointmentBookingService::new(&state).list_mine(&ctx).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_provider_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    ctx.require(Capability::ViewProviderSchedule)?;

    let appointments = AppointmentBookingService::new(&state).list_for_provider(&ctx).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    path: Result<Path<Uuid>, PathRejection>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let Path(appointment_id) = path?;
    let appointment = AppointmentBookingService::new(&state)
        .get_one(&ctx, appointment_id)
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    path: Result<Path<Uuid>, PathRejection>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let Path(appointment_id) = path?;
    ctx.require(Capability::CancelAppointment)?;

    let appointment = AppointmentBookingService::new(&state)
        .cancel(&ctx, appointment_id)
        .await?;

    Ok(Json(json!({
        "message": "Appointment cancelled successfully",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppConfig>>,
    path: Result<Path<Uuid>, PathRejection>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let Path(appointment_id) = path?;
    ctx.require(Capability::CompleteAppointment)?;

    let appointment = AppointmentBookingService::new(&state)
        .complete(&ctx, appointment_id)
        .await?;

    Ok(Json(json!({
        "message": "Appointment marked as completed",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn list_psychologists(State(state): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let psychologists = ProviderDirectory::new(&state).psychologists().await?;

    Ok(Json(json!({
        "psychologists": psychologists,
        "total": psychologists.len()
    })))
}

#[axum::debug_handler]
pub async fn get_my_clients(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let clients = ProviderDirectory::new(&state).clients(&ctx).await?;

    Ok(Json(json!({
        "clients": clients,
        "total": clients.len()
    })))
}
