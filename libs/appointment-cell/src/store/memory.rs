use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, NewAppointment, SlotConflict, TimeSlot};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::store::AppointmentStore;

/// Process-local store. Both uniqueness rules are checked and the row is
/// written under one lock, so concurrent inserts of the same slot serialize.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: Mutex<Vec<Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn transition(
        &self,
        id: Uuid,
        owned_by: impl Fn(&Appointment) -> bool + Send,
        to: AppointmentStatus,
    ) -> Option<Appointment> {
        let mut appointments = self.appointments.lock().await;
        let appointment = appointments
            .iter_mut()
            .find(|a| a.id == id && owned_by(a))?;

        if !AppointmentLifecycleService::can_transition(appointment.status, to) {
            return None;
        }
        appointment.status = to;
        Some(appointment.clone())
    }
}

fn sorted_by_schedule(mut appointments: Vec<Appointment>) -> Vec<Appointment> {
    appointments.sort_by(|a, b| (a.date, a.time_slot).cmp(&(b.date, b.time_slot)));
    appointments
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn find_active_for_provider_slot(
        &self,
        psychologist_id: Uuid,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let appointments = self.appointments.lock().await;
        Ok(appointments
            .iter()
            .find(|a| {
                a.psychologist_id == psychologist_id
                    && a.date == date
                    && a.time_slot == slot
                    && a.status.occupies_slot()
            })
            .cloned())
    }

    async fn find_active_for_requester_slot(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let appointments = self.appointments.lock().await;
        Ok(appointments
            .iter()
            .find(|a| a.user_id == user_id && a.date == date && a.time_slot == slot && a.status.occupies_slot())
            .cloned())
    }

    async fn insert(&self, new: NewAppointment) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.appointments.lock().await;

        let held = |a: &&Appointment| a.date == new.date && a.time_slot == new.time_slot && a.status.occupies_slot();
        if appointments.iter().filter(held).any(|a| a.psychologist_id == new.psychologist_id) {
            return Err(SlotConflict::ProviderSlotTaken.into());
        }
        if appointments.iter().filter(held).any(|a| a.user_id == new.user_id) {
            return Err(SlotConflict::RequesterAlreadyBooked.into());
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            psychologist_id: new.psychologist_id,
            date: new.date,
            time_slot: new.time_slot,
            reason: new.reason,
            status: AppointmentStatus::Booked,
            payment_id: None,
            created_at: Utc::now(),
        };
        appointments.push(appointment.clone());
        Ok(appointment)
    }

    async fn booked_slots(&self, psychologist_id: Uuid, date: NaiveDate) -> Result<Vec<TimeSlot>, AppointmentError> {
        let appointments = self.appointments.lock().await;
        Ok(appointments
            .iter()
            .filter(|a| a.psychologist_id == psychologist_id && a.date == date && a.status.occupies_slot())
            .map(|a| a.time_slot)
            .collect())
    }

    async fn list_for_requester(&self, user_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let appointments = self.appointments.lock().await;
        Ok(sorted_by_schedule(
            appointments.iter().filter(|a| a.user_id == user_id).cloned().collect(),
        ))
    }

    async fn list_for_provider(&self, psychologist_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        let appointments = self.appointments.lock().await;
        Ok(sorted_by_schedule(
            appointments
                .iter()
                .filter(|a| a.psychologist_id == psychologist_id)
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let appointments = self.appointments.lock().await;
        Ok(appointments.iter().find(|a| a.id == id).cloned())
    }

    async fn cancel(&self, id: Uuid, user_id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self
            .transition(id, |a| a.user_id == user_id, AppointmentStatus::Cancelled)
            .await)
    }

    async fn complete(&self, id: Uuid, psychologist_id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self
            .transition(id, |a| a.psychologist_id == psychologist_id, AppointmentStatus::Completed)
            .await)
    }
}
