// libs/appointment-cell/src/services/slots.rs
use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use uuid::Uuid;

use crate::models::{AppointmentError, TimeSlot};

fn date_shape() -> Option<&'static Regex> {
    static SHAPE: OnceLock<Option<Regex>> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok()).as_ref()
}

pub fn parse_provider_id(raw: &str) -> Result<Uuid, AppointmentError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppointmentError::Validation("Invalid psychologist ID".to_string()))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppointmentError> {
    let invalid = || AppointmentError::Validation(format!("Invalid date: {}", raw));
    if !date_shape().map(|shape| shape.is_match(raw)).unwrap_or(false) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())
}

/// A booking date must parse and must not be before `today`.
pub fn parse_booking_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, AppointmentError> {
    let date = parse_date(raw)?;
    if date < today {
        return Err(AppointmentError::Validation(
            "Cannot book an appointment in the past".to_string(),
        ));
    }
    Ok(date)
}

/// Splits the fixed slot universe into (available, booked). The two lists
/// are disjoint, ordered by hour, and together cover every slot.
pub fn partition_slots(held: &[TimeSlot]) -> (Vec<TimeSlot>, Vec<TimeSlot>) {
    let held: HashSet<TimeSlot> = held.iter().copied().collect();
    TimeSlot::all().partition(|slot| !held.contains(slot))
}
