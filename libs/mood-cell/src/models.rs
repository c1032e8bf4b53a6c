use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::supabase::DatabaseError;
use shared_models::error::AppError;
use shared_models::sentiment::Sentiment;

pub const DEFAULT_HISTORY_DAYS: i64 = 30;
pub const MAX_HISTORY_DAYS: i64 = 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sentiment: Sentiment,
    pub created_at: DateTime<Utc>,
}

/// The label stays a raw string so an unknown value is answered with our
/// own 400 instead of the extractor's rejection.
#[derive(Debug, Deserialize)]
pub struct LogMoodRequest {
    #[serde(default)]
    pub sentiment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MoodHistoryQuery {
    pub days: Option<i64>,
}

impl MoodHistoryQuery {
    pub fn window_days(&self) -> i64 {
        self.days
            .unwrap_or(DEFAULT_HISTORY_DAYS)
            .clamp(1, MAX_HISTORY_DAYS)
    }
}

#[derive(Error, Debug)]
pub enum MoodError {
    #[error("Invalid sentiment value")]
    InvalidSentiment,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<MoodError> for AppError {
    fn from(err: MoodError) -> Self {
        match err {
            MoodError::InvalidSentiment => AppError::BadRequest(err.to_string()),
            MoodError::Database(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_window_is_clamped() {
        assert_eq!(MoodHistoryQuery::default().window_days(), 30);
        assert_eq!(MoodHistoryQuery { days: Some(0) }.window_days(), 1);
        assert_eq!(MoodHistoryQuery { days: Some(9999) }.window_days(), 365);
        assert_eq!(MoodHistoryQuery { days: Some(7) }.window_days(), 7);
    }

    #[test]
    fn invalid_sentiment_is_a_bad_request() {
        let app: AppError = MoodError::InvalidSentiment.into();
        assert_eq!(app.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(app.message(), "Invalid sentiment value");
    }
}
