use chrono::{DateTime, Utc};
use futures::try_join;
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::AuthContext;

use crate::models::{
    ActivityItem, AnalyticsError, MoodStats, MoodTrends, ProviderStats, SessionSummary,
    UserReport, UserStats, WellnessInsights, MONTHLY_WINDOW_DAYS, WEEKLY_WINDOW_DAYS,
};
use crate::services::aggregate::{self, window_start};
use crate::services::repository::AnalyticsRepository;

/// Fetches each view's inputs concurrently and hands them to the pure
/// aggregations.
pub struct DashboardService {
    repository: AnalyticsRepository,
}

impl DashboardService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            repository: AnalyticsRepository::new(config),
        }
    }

    pub async fn mood_stats(&self, ctx: &AuthContext, now: DateTime<Utc>) -> Result<MoodStats, AnalyticsError> {
        let since = window_start(now, MONTHLY_WINDOW_DAYS);
        let moods = self.repository.mood_entries_since(ctx.user_id, since).await?;
        Ok(aggregate::mood_stats(&moods, now))
    }

    pub async fn user_stats(&self, ctx: &AuthContext, now: DateTime<Utc>) -> Result<UserStats, AnalyticsError> {
        let since = window_start(now, MONTHLY_WINDOW_DAYS);
        let (moods, exchanges, appointments, payments) = try_join!(
            self.repository.mood_entries_since(ctx.user_id, since),
            self.repository.exchanges_since(ctx.user_id, since),
            self.repository.appointments_since(ctx.user_id, since),
            self.repository.payments_since(ctx.user_id, since),
        )?;
        Ok(aggregate::user_stats(&moods, &exchanges, &appointments, &payments, now))
    }

    pub async fn mood_trends(&self, ctx: &AuthContext, now: DateTime<Utc>) -> Result<MoodTrends, AnalyticsError> {
        let since = window_start(now, WEEKLY_WINDOW_DAYS);
        let moods = self.repository.mood_entries_since(ctx.user_id, since).await?;
        Ok(aggregate::mood_trends(&moods, now))
    }

    pub async fn session_analytics(
        &self,
        ctx: &AuthContext,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionSummary>, AnalyticsError> {
        let since = window_start(now, MONTHLY_WINDOW_DAYS);
        let exchanges = self.repository.exchanges_since(ctx.user_id, since).await?;
        Ok(aggregate::session_analytics(&exchanges, now))
    }

    pub async fn wellness_insights(
        &self,
        ctx: &AuthContext,
        now: DateTime<Utc>,
    ) -> Result<WellnessInsights, AnalyticsError> {
        let since = window_start(now, MONTHLY_WINDOW_DAYS);
        let (moods, exchanges, appointments) = try_join!(
            self.repository.mood_entries_since(ctx.user_id, since),
            self.repository.exchanges_since(ctx.user_id, since),
            self.repository.appointments_since(ctx.user_id, since),
        )?;
        Ok(aggregate::wellness_insights(&moods, &exchanges, &appointments, now))
    }

    pub async fn user_report(&self, ctx: &AuthContext, now: DateTime<Utc>) -> Result<UserReport, AnalyticsError> {
        let since = window_start(now, MONTHLY_WINDOW_DAYS);
        let (moods, exchanges, appointments, payments) = try_join!(
            self.repository.mood_entries_since(ctx.user_id, since),
            self.repository.exchanges_since(ctx.user_id, since),
            self.repository.appointments_since(ctx.user_id, since),
            self.repository.payments_since(ctx.user_id, since),
        )?;
        debug!("Building report for user {}", ctx.user_id);
        Ok(aggregate::user_report(&moods, &exchanges, &appointments, &payments, now))
    }

    pub async fn recent_activity(&self, ctx: &AuthContext) -> Result<Vec<ActivityItem>, AnalyticsError> {
        let (exchange, appointment, payment) = try_join!(
            self.repository.latest_exchange(ctx.user_id),
            self.repository.latest_appointment(ctx.user_id),
            self.repository.latest_open_payment(ctx.user_id),
        )?;

        let psychologist = match &appointment {
            Some(a) => self
                .repository
                .provider_profile(a.psychologist_id)
                .await?
                .map(|profile| profile.name),
            None => None,
        };

        Ok(aggregate::recent_activity(
            exchange.as_ref(),
            appointment.as_ref().map(|a| (a, psychologist)),
            payment.as_ref(),
        ))
    }

    pub async fn provider_stats(&self, ctx: &AuthContext, now: DateTime<Utc>) -> Result<ProviderStats, AnalyticsError> {
        let (appointments, hourly_rate) = try_join!(
            self.repository.provider_appointments(ctx.user_id),
            self.repository.hourly_rate(ctx.user_id),
        )?;
        debug!(
            "Provider {} has {} appointments at rate {}",
            ctx.user_id,
            appointments.len(),
            hourly_rate
        );
        Ok(aggregate::provider_stats(&appointments, hourly_rate, now.date_naive()))
    }
}
