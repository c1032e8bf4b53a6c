// libs/appointment-cell/src/services/directory.rs
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{AuthContext, Capability};
use shared_models::error::AppError;
use shared_models::sentiment::Sentiment;

use crate::models::{AppointmentError, ClientSummary, PsychologistListing};

/// Mood entries per client that feed the trend.
pub const CLIENT_MOOD_WINDOW: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientVisit {
    pub user_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientMood {
    pub user_id: Uuid,
    pub sentiment: Sentiment,
}

fn trend_score(sentiment: Sentiment) -> u8 {
    match sentiment {
        Sentiment::Positive => 5,
        Sentiment::Neutral => 3,
        Sentiment::Negative => 1,
    }
}

fn overall(moods: &[Sentiment]) -> Sentiment {
    let positive = moods.iter().filter(|s| **s == Sentiment::Positive).count();
    let negative = moods.iter().filter(|s| **s == Sentiment::Negative).count();
    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

/// Folds a provider's visits into one summary per client, most recently
/// seen first. `visits` must be newest first, as must `moods`.
pub fn summarize_clients(
    visits: &[ClientVisit],
    accounts: &[ClientAccount],
    moods: &[ClientMood],
) -> Vec<ClientSummary> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut seen: HashMap<Uuid, (NaiveDate, usize)> = HashMap::new();
    for visit in visits {
        seen.entry(visit.user_id)
            .and_modify(|(_, total)| *total += 1)
            .or_insert_with(|| {
                order.push(visit.user_id);
                (visit.date, 1)
            });
    }

    let mut recent_moods: HashMap<Uuid, Vec<Sentiment>> = HashMap::new();
    for mood in moods {
        let entries = recent_moods.entry(mood.user_id).or_default();
        if entries.len() < CLIENT_MOOD_WINDOW {
            entries.push(mood.sentiment);
        }
    }

    let accounts: HashMap<Uuid, &ClientAccount> = accounts.iter().map(|a| (a.id, a)).collect();

    order
        .into_iter()
        .filter_map(|user_id| {
            let (last_session, total_appointments) = seen.get(&user_id).copied()?;
            let moods = recent_moods.remove(&user_id).unwrap_or_default();
            let (name, email) = match accounts.get(&user_id) {
                Some(account) => (account.name.clone(), account.email.clone()),
                None => ("Unknown".to_string(), "Unknown".to_string()),
            };
            Some(ClientSummary {
                user_id,
                name,
                email,
                last_session,
                total_appointments,
                mood_trend: moods.iter().copied().map(trend_score).collect(),
                sentiment: overall(&moods),
            })
        })
        .collect()
}

fn id_list(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",")
}

pub struct ProviderDirectory {
    supabase: SupabaseClient,
}

impl ProviderDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn psychologists(&self) -> Result<Vec<PsychologistListing>, AppError> {
        let rows = self
            .supabase
            .select("/rest/v1/psychologists?select=user_id,name,specialization,hourly_rate,bio&order=name.asc")
            .await
            .map_err(AppointmentError::from)?;
        Ok(rows)
    }

    /// Everyone who has held a slot with the calling psychologist.
    /// Cancelled bookings do not count as sessions.
    pub async fn clients(&self, ctx: &AuthContext) -> Result<Vec<ClientSummary>, AppError> {
        ctx.require(Capability::ViewProviderSchedule)?;

        let path = format!(
            "/rest/v1/appointments?psychologist_id=eq.{}&status=in.(Booked,Completed)&select=user_id,date&order=date.desc,time_slot.desc",
            ctx.user_id
        );
        let visits: Vec<ClientVisit> = self.supabase.select(&path).await.map_err(AppointmentError::from)?;
        if visits.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<Uuid> = visits.iter().map(|v| v.user_id).collect();
        ids.sort();
        ids.dedup();
        let ids = id_list(&ids);

        let accounts: Vec<ClientAccount> = self
            .supabase
            .select(&format!("/rest/v1/users?id=in.({})&select=id,name,email", ids))
            .await
            .map_err(AppointmentError::from)?;
        let moods: Vec<ClientMood> = self
            .supabase
            .select(&format!(
                "/rest/v1/mood_entries?user_id=in.({})&select=user_id,sentiment&order=created_at.desc",
                ids
            ))
            .await
            .map_err(AppointmentError::from)?;

        let clients = summarize_clients(&visits, &accounts, &moods);
        debug!("Psychologist {} has {} clients", ctx.user_id, clients.len());
        Ok(clients)
    }
}
