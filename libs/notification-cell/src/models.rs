use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    AppointmentConfirmation,
    AppointmentCancellation,
}

impl NotificationTemplate {
    pub fn subject(&self) -> &'static str {
        match self {
            NotificationTemplate::AppointmentConfirmation => "Appointment Confirmation",
            NotificationTemplate::AppointmentCancellation => "Appointment Cancelled",
        }
    }
}

impl fmt::Display for NotificationTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationTemplate::AppointmentConfirmation => write!(f, "appointment_confirmation"),
            NotificationTemplate::AppointmentCancellation => write!(f, "appointment_cancellation"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub template: NotificationTemplate,
    pub recipient: String,
    pub data: Value,
}

impl Notification {
    pub fn new(template: NotificationTemplate, recipient: impl Into<String>, data: Value) -> Self {
        Self {
            template,
            recipient: recipient.into(),
            data,
        }
    }
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Relay rejected notification ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Relay unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}
