use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError, NewAppointment, TimeSlot};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryAppointmentStore;
pub use supabase::SupabaseAppointmentStore;

/// Persistence for appointments.
///
/// Implementations must reject an insert that would give a provider or a
/// requester two slot-holding appointments at the same (date, slot), and
/// report it as the matching `SlotConflict`. The `find_active_*` lookups
/// only exist to give a friendlier answer before that happens.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn find_active_for_provider_slot(
        &self,
        psychologist_id: Uuid,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> Result<Option<Appointment>, AppointmentError>;

    async fn find_active_for_requester_slot(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> Result<Option<Appointment>, AppointmentError>;

    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, AppointmentError>;

    /// Slots held by Booked or Completed appointments.
    async fn booked_slots(&self, psychologist_id: Uuid, date: NaiveDate) -> Result<Vec<TimeSlot>, AppointmentError>;

    async fn list_for_requester(&self, user_id: Uuid) -> Result<Vec<Appointment>, AppointmentError>;

    async fn list_for_provider(&self, psychologist_id: Uuid) -> Result<Vec<Appointment>, AppointmentError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    /// Booked -> Cancelled for the requester's own appointment. `None` when
    /// nothing matched.
    async fn cancel(&self, id: Uuid, user_id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    /// Booked -> Completed for the provider's own appointment. `None` when
    /// nothing matched.
    async fn complete(&self, id: Uuid, psychologist_id: Uuid) -> Result<Option<Appointment>, AppointmentError>;
}
