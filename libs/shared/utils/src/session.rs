use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{Account, TokenPair, TokenSubject};
use shared_models::error::AppError;

use crate::jwt::{issue_token_pair, validate_refresh_token};

pub async fn find_account(client: &SupabaseClient, user_id: Uuid) -> Result<Option<Account>, AppError> {
    let path = format!("/rest/v1/users?id=eq.{}&select=*", user_id);
    let mut rows: Vec<Account> = client.select(&path).await?;
    Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
}

pub async fn store_refresh_token(client: &SupabaseClient, user_id: Uuid, token: &str) -> Result<(), AppError> {
    let path = format!("/rest/v1/users?id=eq.{}", user_id);
    let updated: Vec<serde_json::Value> = client
        .update(&path, json!({ "refresh_token": token }))
        .await?;
    if updated.is_empty() {
        return Err(AppError::NotFound("Account not found".to_string()));
    }
    Ok(())
}

/// Issues a fresh token pair for the account and persists its refresh token.
pub async fn start_session(
    client: &SupabaseClient,
    account: &Account,
    config: &AppConfig,
) -> Result<TokenPair, AppError> {
    let pair = issue_token_pair(&TokenSubject::from(account), config)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    store_refresh_token(client, account.id, &pair.refresh_token).await?;
    Ok(pair)
}

/// Exchanges a refresh token for a new pair. The presented token must match
/// the one stored on the account; the stored one is replaced.
pub async fn rotate_session(config: &AppConfig, refresh_token: &str) -> Result<(Account, TokenPair), AppError> {
    let claims = validate_refresh_token(refresh_token, &config.jwt_secret).map_err(|e| {
        debug!("Refresh token rejected: {}", e);
        AppError::Forbidden("Invalid refresh token".to_string())
    })?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Forbidden("Invalid refresh token".to_string()))?;

    let client = SupabaseClient::new(config);
    let account = find_account(&client, user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Invalid refresh token".to_string()))?;

    if account.refresh_token.as_deref() != Some(refresh_token) {
        warn!("Refresh token for user {} does not match the stored token", user_id);
        return Err(AppError::Forbidden("Invalid refresh token".to_string()));
    }

    let pair = start_session(&client, &account, config).await?;
    info!("Rotated session tokens for user {}", user_id);

    Ok((account, pair))
}
