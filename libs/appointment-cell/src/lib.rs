pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use models::{Appointment, AppointmentError, AppointmentStatus, SlotConflict, TimeSlot};
pub use store::{AppointmentStore, InMemoryAppointmentStore, SupabaseAppointmentStore};
