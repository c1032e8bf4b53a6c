use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use appointment_cell::{Appointment, AppointmentStatus};
use mood_cell::MoodEntry;
use payment_cell::{PaymentRecord, PaymentStatus};
use shared_database::supabase::DatabaseError;
use shared_models::error::AppError;
use shared_models::sentiment::Sentiment;

// Dashboard payloads keep the camelCase names the existing clients read.

pub const MONTHLY_WINDOW_DAYS: i64 = 30;
pub const WEEKLY_WINDOW_DAYS: i64 = 7;
pub const MAX_SESSION_SUMMARIES: usize = 10;
pub const REVENUE_MONTHS: u32 = 4;
pub const BOOKING_WEEKS: i64 = 4;
pub const DEFAULT_HOURLY_RATE: i64 = 2000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MoodCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl MoodCounts {
    pub fn add(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodPoint {
    pub date: NaiveDate,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodStats {
    pub status: String,
    pub percentage: String,
    pub history: Vec<MoodPoint>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AppointmentCounts {
    pub booked: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl AppointmentCounts {
    pub fn add(&mut self, status: AppointmentStatus) {
        match status {
            AppointmentStatus::Booked => self.booked += 1,
            AppointmentStatus::Completed => self.completed += 1,
            AppointmentStatus::Cancelled => self.cancelled += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTotals {
    pub total_amount: i64,
    pub total_payments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub mood: MoodCounts,
    pub sessions: usize,
    pub appointments: AppointmentCounts,
    pub payments: PaymentTotals,
    pub total_mood_entries: usize,
}

/// Per-day counts keyed by `YYYY-MM-DD`, ascending.
pub type MoodTrends = BTreeMap<String, MoodCounts>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub message_count: usize,
    pub average_sentiment: f64,
    pub last_activity: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSnapshot {
    pub last_mood: Option<Sentiment>,
    pub last_session: Option<DateTime<Utc>>,
    pub last_appointment: Option<Appointment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WellnessInsights {
    pub wellness_score: u32,
    pub total_moods: usize,
    pub positive_moods: usize,
    pub total_exchanges: usize,
    pub total_appointments: usize,
    pub recommendations: Vec<String>,
    pub recent_activity: RecentSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MoodTrend {
    Improving,
    Stable,
    Declining,
    #[serde(rename = "No data")]
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_mood_entries: usize,
    pub total_exchanges: usize,
    pub total_appointments: usize,
    pub total_payments: usize,
    pub total_spent: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodAnalysis {
    #[serde(flatten)]
    pub counts: MoodCounts,
    pub trend: MoodTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAnalysis {
    pub total_messages: usize,
    pub average_messages_per_session: usize,
    pub unique_sessions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentAnalysis {
    #[serde(flatten)]
    pub counts: AppointmentCounts,
    pub upcoming: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetails {
    pub mood_entries: Vec<MoodEntry>,
    pub recent_appointments: Vec<Appointment>,
    pub recent_payments: Vec<PaymentRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReport {
    pub period: String,
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub mood_analysis: MoodAnalysis,
    pub session_analysis: SessionAnalysis,
    pub appointment_analysis: AppointmentAnalysis,
    pub detailed_data: ReportDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyBookings {
    pub week: String,
    pub bookings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: AppointmentStatus,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStats {
    pub bookings: Vec<WeeklyBookings>,
    pub revenue: Vec<MonthlyRevenue>,
    pub status: Vec<StatusCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActivityItem {
    Session {
        time: DateTime<Utc>,
        sentiment: Sentiment,
    },
    Appointment {
        time: NaiveDateTime,
        psychologist: String,
    },
    Payment {
        time: DateTime<Utc>,
        amount: i64,
        status: PaymentStatus,
    },
}

/// Provider name lookup result used by recent activity.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProviderProfile {
    pub user_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub hourly_rate: Option<i64>,
}

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Database(db) => db.into(),
        }
    }
}
