use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use shared_database::supabase::DatabaseError;
use shared_models::error::AppError;

use crate::services::signature::SignatureError;

pub const DEFAULT_CURRENCY: &str = "pkr";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Success => write!(f, "Success"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentProcessor {
    Stripe,
    JazzCash,
    EasyPaisa,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub appointment_id: Uuid,
    /// Minor units (cents, paisa).
    pub amount: i64,
    pub currency: String,
    pub processor: PaymentProcessor,
    pub processor_reference: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Usd,
    Pkr,
}

impl Currency {
    /// Smallest chargeable amount in minor units.
    pub fn minimum_amount(&self) -> i64 {
        match self {
            Currency::Usd => 100,
            Currency::Pkr => 10_000,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "usd",
            Currency::Pkr => "pkr",
        }
    }
}

impl FromStr for Currency {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "usd" => Ok(Currency::Usd),
            "pkr" => Ok(Currency::Pkr),
            _ => Err(PaymentError::UnsupportedCurrency(s.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentIntentRequest {
    #[serde(default, alias = "appointmentId")]
    pub appointment_id: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
    pub payment_id: Uuid,
    pub payment_intent_id: String,
}

/// The processor's view of a created intent.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: Value,
}

impl WebhookEvent {
    /// Ledger status implied by this event, if it is one we track.
    pub fn payment_outcome(&self) -> Option<PaymentStatus> {
        match self.event_type.as_str() {
            "payment_intent.succeeded" => Some(PaymentStatus::Success),
            "payment_intent.payment_failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }

    pub fn intent_id(&self) -> Option<&str> {
        self.data.object["id"].as_str()
    }
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Amount is required")]
    AmountRequired,

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Amount must be at least {} {}", .minimum / 100, .currency.to_uppercase())]
    AmountTooLow { minimum: i64, currency: String },

    #[error("Invalid appointment ID")]
    InvalidAppointment,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Payment processor is not configured")]
    NotConfigured,

    #[error("Payment failed: {0}")]
    Processor(String),

    #[error("Webhook error: {0}")]
    Signature(#[from] SignatureError),

    #[error("Webhook error: {0}")]
    MalformedEvent(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::AmountRequired
            | PaymentError::UnsupportedCurrency(_)
            | PaymentError::AmountTooLow { .. }
            | PaymentError::InvalidAppointment
            | PaymentError::Signature(_)
            | PaymentError::MalformedEvent(_) => AppError::BadRequest(err.to_string()),
            PaymentError::AppointmentNotFound => AppError::NotFound(err.to_string()),
            PaymentError::NotConfigured | PaymentError::Processor(_) => {
                AppError::UpstreamFailure(err.to_string())
            }
            PaymentError::Database(db) => db.into(),
        }
    }
}
