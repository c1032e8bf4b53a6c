use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AuthContext;
use shared_models::sentiment::Sentiment;

use crate::models::{MoodEntry, MoodError};

pub struct MoodService {
    supabase: SupabaseClient,
}

impl MoodService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub fn parse_sentiment(raw: Option<&str>) -> Result<Sentiment, MoodError> {
        raw.and_then(|s| s.parse().ok())
            .ok_or(MoodError::InvalidSentiment)
    }

    /// Appends one entry for the caller. Entries are never edited.
    pub async fn log(&self, ctx: &AuthContext, raw_sentiment: Option<&str>) -> Result<MoodEntry, MoodError> {
        let sentiment = Self::parse_sentiment(raw_sentiment)?;

        let entry: MoodEntry = self
            .supabase
            .insert(
                "mood_entries",
                json!({
                    "user_id": ctx.user_id,
                    "sentiment": sentiment,
                }),
            )
            .await?;

        info!("Mood logged for user {}: {}", ctx.user_id, sentiment);
        Ok(entry)
    }

    /// Caller's entries from the trailing window, newest first.
    pub async fn history(
        &self,
        ctx: &AuthContext,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<MoodEntry>, MoodError> {
        let since = now - Duration::days(days);
        let path = format!(
            "/rest/v1/mood_entries?user_id=eq.{}&created_at=gte.{}&order=created_at.desc",
            ctx.user_id,
            since.format("%Y-%m-%dT%H:%M:%SZ")
        );
        debug!("Fetching {} day mood history for user {}", days, ctx.user_id);

        Ok(self.supabase.select(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn sentiment_must_be_a_known_label() {
        assert_eq!(MoodService::parse_sentiment(Some("neutral")).unwrap(), Sentiment::Neutral);
        assert_matches!(MoodService::parse_sentiment(Some("ecstatic")), Err(MoodError::InvalidSentiment));
        assert_matches!(MoodService::parse_sentiment(None), Err(MoodError::InvalidSentiment));
    }
}
