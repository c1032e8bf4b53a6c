use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, NewAppointment, TimeSlot};
use crate::store::AppointmentStore;

const SLOT_HOLDING: &str = "status=in.(Booked,Completed)";
const SCHEDULE_ORDER: &str = "order=date.asc,time_slot.asc";

/// PostgREST-backed store. Slot uniqueness comes from the partial unique
/// indexes in `supabase/migrations`.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

#[derive(Debug, Deserialize)]
struct SlotRow {
    time_slot: TimeSlot,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn first(&self, path: &str) -> Result<Option<Appointment>, AppointmentError> {
        let mut rows: Vec<Appointment> = self.supabase.select(path).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }

    async fn transition(&self, filter: String, to: AppointmentStatus) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?{}", filter);
        let mut rows: Vec<Appointment> = self
            .supabase
            .update(&path, json!({ "status": to }))
            .await?;
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn find_active_for_provider_slot(
        &self,
        psychologist_id: Uuid,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?psychologist_id=eq.{}&date=eq.{}&time_slot=eq.{}&{}&limit=1",
            psychologist_id, date, slot, SLOT_HOLDING
        );
        self.first(&path).await
    }

    async fn find_active_for_requester_slot(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&date=eq.{}&time_slot=eq.{}&{}&limit=1",
            user_id, date, slot, SLOT_HOLDING
        );
        self.first(&path).await
    }

    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, AppointmentError> {
        debug!(
            "Inserting appointment for {} with {} on {} {}",
            appointment.user_id, appointment.psychologist_id, appointment.date, appointment.time_slot
        );

        let row = json!({
            "user_id": appointment.user_id,
            "psychologist_id": appointment.psychologist_id,
            "date": appointment.date,
            "time_slot": appointment.time_slot,
            "reason": appointment.reason,
            "status": AppointmentStatus::Booked,
        });

        Ok(self.supabase.insert("appointments", row).await?)
    }

    async fn booked_slots(&self, psychologist_id: Uuid, date: NaiveDate) -> Result<Vec<TimeSlot>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?psychologist_id=eq.{}&date=eq.{}&{}&select=time_slot",
            psychologist_id, date, SLOT_HOLDING
        );
        let rows: Vec<SlotRow> = self.supabase.select(&path).await?;
        Ok(rows.into_iter().map(|r| r.time_slot).collect())
    }

    async fn list_for_requester(&self, user_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?user_id=eq.{}&{}", user_id, SCHEDULE_ORDER);
        Ok(self.supabase.select(&path).await?)
    }

    async fn list_for_provider(&self, psychologist_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?psychologist_id=eq.{}&{}",
            psychologist_id, SCHEDULE_ORDER
        );
        Ok(self.supabase.select(&path).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        self.first(&format!("/rest/v1/appointments?id=eq.{}", id)).await
    }

    async fn cancel(&self, id: Uuid, user_id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        self.transition(
            format!("id=eq.{}&user_id=eq.{}&status=eq.Booked", id, user_id),
            AppointmentStatus::Cancelled,
        )
        .await
    }

    async fn complete(&self, id: Uuid, psychologist_id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        self.transition(
            format!("id=eq.{}&psychologist_id=eq.{}&status=eq.Booked", id, psychologist_id),
            AppointmentStatus::Completed,
        )
        .await
    }
}
