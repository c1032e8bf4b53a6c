use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use appointment_cell::Appointment;
use chatbot_cell::ConversationExchange;
use mood_cell::MoodEntry;
use payment_cell::PaymentRecord;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AnalyticsError, ProviderProfile, DEFAULT_HOURLY_RATE};

fn stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Read-only queries feeding the dashboard.
pub struct AnalyticsRepository {
    supabase: SupabaseClient,
}

impl AnalyticsRepository {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn rows<T: DeserializeOwned>(&self, path: String) -> Result<Vec<T>, AnalyticsError> {
        debug!("Analytics query {}", path);
        Ok(self.supabase.select(&path).await?)
    }

    async fn first<T: DeserializeOwned>(&self, path: String) -> Result<Option<T>, AnalyticsError> {
        Ok(self.rows(path).await?.into_iter().next())
    }

    pub async fn mood_entries_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<Vec<MoodEntry>, AnalyticsError> {
        self.rows(format!(
            "/rest/v1/mood_entries?user_id=eq.{}&created_at=gte.{}&order=created_at.desc",
            user_id,
            stamp(since)
        ))
        .await
    }

    pub async fn exchanges_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<ConversationExchange>, AnalyticsError> {
        self.rows(format!(
            "/rest/v1/chat_exchanges?user_id=eq.{}&created_at=gte.{}&order=created_at.desc",
            user_id,
            stamp(since)
        ))
        .await
    }

    pub async fn appointments_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<Vec<Appointment>, AnalyticsError> {
        self.rows(format!(
            "/rest/v1/appointments?user_id=eq.{}&created_at=gte.{}&order=created_at.desc",
            user_id,
            stamp(since)
        ))
        .await
    }

    pub async fn payments_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<Vec<PaymentRecord>, AnalyticsError> {
        self.rows(format!(
            "/rest/v1/payments?user_id=eq.{}&created_at=gte.{}&order=created_at.desc",
            user_id,
            stamp(since)
        ))
        .await
    }

    pub async fn provider_appointments(&self, psychologist_id: Uuid) -> Result<Vec<Appointment>, AnalyticsError> {
        self.rows(format!(
            "/rest/v1/appointments?psychologist_id=eq.{}&order=date.asc,time_slot.asc",
            psychologist_id
        ))
        .await
    }

    pub async fn provider_profile(&self, psychologist_id: Uuid) -> Result<Option<ProviderProfile>, AnalyticsError> {
        self.first(format!(
            "/rest/v1/psychologists?user_id=eq.{}&select=user_id,name,hourly_rate&limit=1",
            psychologist_id
        ))
        .await
    }

    pub async fn hourly_rate(&self, psychologist_id: Uuid) -> Result<i64, AnalyticsError> {
        Ok(self
            .provider_profile(psychologist_id)
            .await?
            .and_then(|profile| profile.hourly_rate)
            .unwrap_or(DEFAULT_HOURLY_RATE))
    }

    pub async fn latest_exchange(&self, user_id: Uuid) -> Result<Option<ConversationExchange>, AnalyticsError> {
        self.first(format!(
            "/rest/v1/chat_exchanges?user_id=eq.{}&order=created_at.desc&limit=1",
            user_id
        ))
        .await
    }

    pub async fn latest_appointment(&self, user_id: Uuid) -> Result<Option<Appointment>, AnalyticsError> {
        self.first(format!(
            "/rest/v1/appointments?user_id=eq.{}&order=created_at.desc&limit=1",
            user_id
        ))
        .await
    }

    pub async fn latest_open_payment(&self, user_id: Uuid) -> Result<Option<PaymentRecord>, AnalyticsError> {
        self.first(format!(
            "/rest/v1/payments?user_id=eq.{}&status=in.(Success,Pending)&order=created_at.desc&limit=1",
            user_id
        ))
        .await
    }
}
