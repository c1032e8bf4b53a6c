// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use shared_database::supabase::DatabaseError;
use shared_models::error::AppError;
use shared_models::sentiment::Sentiment;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub psychologist_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub payment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.user_id == user_id || self.psychologist_id == user_id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Booked,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Booked and Completed appointments hold their slot.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Booked => write!(f, "Booked"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
            AppointmentStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// An hourly session slot, `09:00` through `17:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeSlot(u8);

impl TimeSlot {
    pub const FIRST_HOUR: u8 = 9;
    pub const LAST_HOUR: u8 = 17;

    pub fn from_hour(hour: u8) -> Option<Self> {
        (Self::FIRST_HOUR..=Self::LAST_HOUR)
            .contains(&hour)
            .then_some(Self(hour))
    }

    pub fn hour(&self) -> u8 {
        self.0
    }

    pub fn start_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.0), 0, 0).unwrap_or_default()
    }

    pub fn all() -> impl Iterator<Item = TimeSlot> {
        (Self::FIRST_HOUR..=Self::LAST_HOUR).map(TimeSlot)
    }
}

fn slot_shape() -> Option<&'static Regex> {
    static SHAPE: OnceLock<Option<Regex>> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(r"^(\d{2}):00$").ok()).as_ref()
}

impl FromStr for TimeSlot {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppointmentError::Validation(format!("Invalid time slot: {}", s));
        let captures = slot_shape()
            .and_then(|shape| shape.captures(s))
            .ok_or_else(invalid)?;
        let hour: u8 = captures[1].parse().map_err(|_| invalid())?;
        TimeSlot::from_hour(hour).ok_or_else(invalid)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// REQUEST / RESPONSE MODELS
// ==============================================================================

/// Raw booking input; fields stay optional strings so validation can answer
/// 400 before anything touches the store.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BookAppointmentRequest {
    #[serde(default, alias = "psychologistId")]
    pub psychologist_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, alias = "timeSlot")]
    pub time_slot: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    #[serde(alias = "psychologistId")]
    pub psychologist_id: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailableSlots {
    pub date: NaiveDate,
    pub psychologist_id: Uuid,
    pub available_slots: Vec<TimeSlot>,
    pub booked_slots: Vec<TimeSlot>,
}

/// Public directory entry for a psychologist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PsychologistListing {
    pub user_id: Uuid,
    pub name: String,
    pub specialization: Option<String>,
    pub hourly_rate: i64,
    pub bio: Option<String>,
}

/// One client as seen from the psychologist's side.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClientSummary {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub last_session: NaiveDate,
    pub total_appointments: usize,
    /// Latest mood entries, newest first, scored 5 / 3 / 1.
    pub mood_trend: Vec<u8>,
    pub sentiment: Sentiment,
}

/// A validated booking, ready for insertion.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub user_id: Uuid,
    pub psychologist_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub reason: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotConflict {
    #[error("This time slot is already booked")]
    ProviderSlotTaken,

    #[error("You already have an appointment at this time")]
    RequesterAlreadyBooked,
}

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Conflict(#[from] SlotConflict),

    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment not found or already cancelled")]
    NotCancellable,

    #[error("Appointment not found or already completed")]
    NotCompletable,

    #[error("Psychologist not found")]
    UnknownProvider,

    #[error("Store error: {0}")]
    Store(String),
}

impl From<DatabaseError> for AppointmentError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation { constraint, .. } => {
                let requester_side = constraint
                    .as_deref()
                    .map(|name| name.contains("requester"))
                    .unwrap_or(false);
                if requester_side {
                    AppointmentError::Conflict(SlotConflict::RequesterAlreadyBooked)
                } else {
                    AppointmentError::Conflict(SlotConflict::ProviderSlotTaken)
                }
            }
            DatabaseError::ForeignKeyViolation { .. } => AppointmentError::UnknownProvider,
            other => AppointmentError::Store(other.to_string()),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::UnknownProvider => AppError::ValidationError(err.to_string()),
            AppointmentError::Conflict(conflict) => AppError::SlotConflict(conflict.to_string()),
            AppointmentError::NotFound
            | AppointmentError::NotCancellable
            | AppointmentError::NotCompletable => AppError::NotFound(err.to_string()),
            AppointmentError::Store(msg) => AppError::Database(msg),
        }
    }
}
