// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use notification_cell::{Notification, NotificationDispatcher, NotificationTemplate};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{AuthContext, Capability};

use crate::models::{
    Appointment, AppointmentError, AvailableSlots, AvailableSlotsQuery, BookAppointmentRequest,
    NewAppointment, SlotConflict,
};
use crate::services::slots::{parse_booking_date, parse_date, parse_provider_id, partition_slots};
use crate::store::{AppointmentStore, SupabaseAppointmentStore};

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

pub struct AppointmentBookingService {
    store: Arc<dyn AppointmentStore>,
    notifications: NotificationDispatcher,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            store: Arc::new(SupabaseAppointmentStore::new(supabase)),
            notifications: NotificationDispatcher::from_config(config),
        }
    }

    pub fn with_store(store: Arc<dyn AppointmentStore>, notifications: NotificationDispatcher) -> Self {
        Self { store, notifications }
    }

    fn validate(
        ctx: &AuthContext,
        request: BookAppointmentRequest,
        today: NaiveDate,
    ) -> Result<NewAppointment, AppointmentError> {
        let (Some(psychologist_id), Some(date), Some(time_slot)) = (
            present(&request.psychologist_id),
            present(&request.date),
            present(&request.time_slot),
        ) else {
            return Err(AppointmentError::Validation("Missing required fields".to_string()));
        };

        let psychologist_id = parse_provider_id(psychologist_id)?;
        let date = parse_booking_date(date, today)?;
        let time_slot = time_slot.parse()?;
        let reason = request
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        Ok(NewAppointment {
            user_id: ctx.user_id,
            psychologist_id,
            date,
            time_slot,
            reason,
        })
    }

    pub async fn book(
        &self,
        ctx: &AuthContext,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        self.book_on(ctx, request, Utc::now().date_naive()).await
    }

    /// Books relative to an explicit `today`.
    pub async fn book_on(
        &self,
        ctx: &AuthContext,
        request: BookAppointmentRequest,
        today: NaiveDate,
    ) -> Result<Appointment, AppointmentError> {
        let new = Self::validate(ctx, request, today)?;
        info!(
            "Booking {} {} with psychologist {} for user {}",
            new.date, new.time_slot, new.psychologist_id, new.user_id
        );

        if self
            .store
            .find_active_for_provider_slot(new.psychologist_id, new.date, new.time_slot)
            .await?
            .is_some()
        {
            debug!("Slot {} {} already held for psychologist {}", new.date, new.time_slot, new.psychologist_id);
            return Err(SlotConflict::ProviderSlotTaken.into());
        }

        if self
            .store
            .find_active_for_requester_slot(new.user_id, new.date, new.time_slot)
            .await?
            .is_some()
        {
            debug!("User {} already holds {} {}", new.user_id, new.date, new.time_slot);
            return Err(SlotConflict::RequesterAlreadyBooked.into());
        }

        // The store's uniqueness check decides any race between here and the insert.
        let appointment = self.store.insert(new).await?;
        info!("Appointment {} booked", appointment.id);

        self.notifications.dispatch(Notification::new(
            NotificationTemplate::AppointmentConfirmation,
            ctx.email.clone(),
            json!({
                "name": ctx.name,
                "appointment_id": appointment.id,
                "psychologist_id": appointment.psychologist_id,
                "date": appointment.date,
                "time_slot": appointment.time_slot,
                "reason": appointment.reason,
            }),
        ));

        Ok(appointment)
    }

    pub async fn available_slots(&self, query: AvailableSlotsQuery) -> Result<AvailableSlots, AppointmentError> {
        let psychologist_id = parse_provider_id(&query.psychologist_id)?;
        let date = parse_date(&query.date)?;

        let held = self.store.booked_slots(psychologist_id, date).await?;
        let (available_slots, booked_slots) = partition_slots(&held);

        Ok(AvailableSlots {
            date,
            psychologist_id,
            available_slots,
            booked_slots,
        })
    }

    pub async fn cancel(&self, ctx: &AuthContext, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .store
            .cancel(appointment_id, ctx.user_id)
            .await?
            .ok_or(AppointmentError::NotCancellable)?;
        info!("Appointment {} cancelled by user {}", appointment.id, ctx.user_id);

        self.notifications.dispatch(Notification::new(
            NotificationTemplate::AppointmentCancellation,
            ctx.email.clone(),
            json!({
                "name": ctx.name,
                "appointment_id": appointment.id,
                "date": appointment.date,
                "time_slot": appointment.time_slot,
            }),
        ));

        Ok(appointment)
    }

    pub async fn complete(&self, ctx: &AuthContext, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .store
            .complete(appointment_id, ctx.user_id)
            .await?
            .ok_or(AppointmentError::NotCompletable)?;
        info!("Appointment {} completed by psychologist {}", appointment.id, ctx.user_id);
        Ok(appointment)
    }

    pub async fn list_mine(&self, ctx: &AuthContext) -> Result<Vec<Appointment>, AppointmentError> {
        self.store.list_for_requester(ctx.user_id).await
    }

    pub async fn list_for_provider(&self, ctx: &AuthContext) -> Result<Vec<Appointment>, AppointmentError> {
        self.store.list_for_provider(ctx.user_id).await
    }

    /// Visible to its requester and provider; admins see any appointment.
    pub async fn get_one(&self, ctx: &AuthContext, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .store
            .find_by_id(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.involves(ctx.user_id) || ctx.has(Capability::ViewAnyAppointment) {
            Ok(appointment)
        } else {
            Err(AppointmentError::NotFound)
        }
    }
}
