use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{Account, AuthContext, Role};
use shared_models::error::AppError;
use shared_utils::session::{find_account, rotate_session, start_session};

use crate::models::{
    AuthError, AuthResponse, LoginRequest, RegisterRequest, UpdateProfileRequest, DEFAULT_HOURLY_RATE,
    MIN_PASSWORD_LENGTH,
};
use crate::services::password::PasswordService;

fn email_shape() -> Option<&'static Regex> {
    static SHAPE: OnceLock<Option<Regex>> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok()).as_ref()
}

fn is_email(raw: &str) -> bool {
    email_shape().is_some_and(|shape| shape.is_match(raw))
}

fn validate_hourly_rate(rate: Option<i64>) -> Result<(), AuthError> {
    match rate {
        Some(rate) if rate <= 0 => Err(AuthError::Validation("Hourly rate must be positive".to_string())),
        _ => Ok(()),
    }
}

pub struct AccountService {
    supabase: Arc<SupabaseClient>,
    config: AppConfig,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            config: config.clone(),
        }
    }

    fn validate_registration(request: &RegisterRequest) -> Result<(), AuthError> {
        if request.name.trim().is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }
        if !is_email(request.email.trim()) {
            return Err(AuthError::Validation("Invalid email address".to_string()));
        }
        if request.password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            )));
        }
        if request.role == Some(Role::Admin) {
            return Err(AuthError::RoleNotAllowed);
        }
        validate_hourly_rate(request.hourly_rate)
    }

    /// Splits a profile edit into the `users` and `psychologists` changes.
    fn profile_changes(
        role: Role,
        request: &UpdateProfileRequest,
    ) -> Result<(Map<String, Value>, Map<String, Value>), AuthError> {
        if request.touches_provider_profile() && role != Role::Psychologist {
            return Err(AuthError::NotAProvider);
        }

        let mut account = Map::new();
        let mut provider = Map::new();

        if let Some(name) = &request.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AuthError::Validation("Name is required".to_string()));
            }
            account.insert("name".to_string(), json!(name));
            if role == Role::Psychologist {
                provider.insert("name".to_string(), json!(name));
            }
        }
        if let Some(email) = &request.email {
            let email = email.trim().to_lowercase();
            if !is_email(&email) {
                return Err(AuthError::Validation("Invalid email address".to_string()));
            }
            account.insert("email".to_string(), json!(email));
        }

        validate_hourly_rate(request.hourly_rate)?;
        if let Some(rate) = request.hourly_rate {
            provider.insert("hourly_rate".to_string(), json!(rate));
        }
        if let Some(specialization) = &request.specialization {
            provider.insert("specialization".to_string(), json!(specialization.trim()));
        }
        if let Some(bio) = &request.bio {
            provider.insert("bio".to_string(), json!(bio.trim()));
        }

        if account.is_empty() && provider.is_empty() {
            return Err(AuthError::Validation("No profile fields provided".to_string()));
        }
        Ok((account, provider))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let path = format!(
            "/rest/v1/users?email=eq.{}&select=*",
            urlencoding::encode(email)
        );
        let mut rows: Vec<Account> = self.supabase.select(&path).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.remove(0)) })
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        Self::validate_registration(&request)?;

        let email = request.email.trim().to_lowercase();
        if self.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken.into());
        }

        let password_hash = PasswordService::hash_password(&request.password)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        let role = request.role.unwrap_or_default();

        let account: Account = self
            .supabase
            .insert(
                "users",
                json!({
                    "name": request.name.trim(),
                    "email": email,
                    "password_hash": password_hash,
                    "role": role,
                }),
            )
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    AuthError::EmailTaken
                } else {
                    AuthError::Database(e)
                }
            })?;

        if role == Role::Psychologist {
            let profile: Result<Value, _> = self
                .supabase
                .insert(
                    "psychologists",
                    json!({
                        "user_id": account.id,
                        "name": account.name,
                        "specialization": request.specialization,
                        "hourly_rate": request.hourly_rate.unwrap_or(DEFAULT_HOURLY_RATE),
                        "bio": request.bio,
                    }),
                )
                .await;
            if let Err(e) = profile {
                // A provider account without its profile cannot be booked or re-registered.
                self.discard_account(account.id).await;
                return Err(AuthError::Database(e).into());
            }
            debug!("Created psychologist profile for {}", account.id);
        }

        let pair = start_session(&self.supabase, &account, &self.config).await?;
        info!("Registered {} account {}", role, account.id);

        Ok(AuthResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            user: account,
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let email = request.email.trim().to_lowercase();
        let account = self
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let matches = PasswordService::verify_password(&request.password, &account.password_hash)
            .map_err(|e| {
                warn!("Stored password hash for {} is unreadable: {}", account.id, e);
                AuthError::InvalidCredentials
            })?;
        if !matches {
            return Err(AuthError::InvalidCredentials.into());
        }

        let pair = start_session(&self.supabase, &account, &self.config).await?;
        info!("User {} logged in", account.id);

        Ok(AuthResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            user: account,
        })
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AppError> {
        let (account, pair) = rotate_session(&self.config, refresh_token).await?;
        Ok(AuthResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            user: account,
        })
    }

    async fn discard_account(&self, user_id: Uuid) {
        let path = format!("/rest/v1/users?id=eq.{}&select=id", user_id);
        match self.supabase.delete::<Value>(&path).await {
            Ok(_) => info!("Removed half-registered account {}", user_id),
            Err(e) => warn!("Could not remove half-registered account {}: {}", user_id, e),
        }
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<Account, AppError> {
        find_account(&self.supabase, user_id)
            .await?
            .ok_or_else(|| AuthError::AccountNotFound.into())
    }

    pub async fn update_profile(&self, ctx: &AuthContext, request: UpdateProfileRequest) -> Result<Account, AppError> {
        let (account_changes, provider_changes) = Self::profile_changes(ctx.role, &request)?;

        let account = if account_changes.is_empty() {
            self.profile(ctx.user_id).await?
        } else {
            let path = format!("/rest/v1/users?id=eq.{}", ctx.user_id);
            let mut rows: Vec<Account> = self
                .supabase
                .update(&path, Value::Object(account_changes))
                .await
                .map_err(|e| {
                    if e.is_unique_violation() {
                        AuthError::EmailTaken
                    } else {
                        AuthError::Database(e)
                    }
                })?;
            if rows.is_empty() {
                return Err(AuthError::AccountNotFound.into());
            }
            rows.remove(0)
        };

        if !provider_changes.is_empty() {
            let path = format!("/rest/v1/psychologists?user_id=eq.{}", ctx.user_id);
            let rows: Vec<Value> = self
                .supabase
                .update(&path, Value::Object(provider_changes))
                .await
                .map_err(AuthError::Database)?;
            if rows.is_empty() {
                warn!("Psychologist {} has no provider profile to update", ctx.user_id);
            }
        }

        info!("Profile updated for {}", ctx.user_id);
        Ok(account)
    }

    /// Removes the account. Appointments, mood entries, chat exchanges and
    /// payments go with it through the store's cascades.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<(), AppError> {
        let path = format!("/rest/v1/users?id=eq.{}&select=id", user_id);
        let removed: Vec<Value> = self.supabase.delete(&path).await.map_err(AuthError::Database)?;
        if removed.is_empty() {
            return Err(AuthError::AccountNotFound.into());
        }

        info!("Deleted account {}", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(role: Option<Role>, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Sara".to_string(),
            email: "sara@example.com".to_string(),
            password: password.to_string(),
            role,
            specialization: None,
            hourly_rate: None,
            bio: None,
        }
    }

    #[test]
    fn admin_cannot_self_register() {
        assert_matches!(
            AccountService::validate_registration(&request(Some(Role::Admin), "secret123")),
            Err(AuthError::RoleNotAllowed)
        );
    }

    #[test]
    fn short_password_is_rejected() {
        assert_matches!(
            AccountService::validate_registration(&request(None, "abc")),
            Err(AuthError::Validation(_))
        );
    }

    #[test]
    fn profile_edit_splits_account_and_provider_fields() {
        let edit = UpdateProfileRequest {
            name: Some("  Dr. Sara  ".to_string()),
            email: Some("Sara@Example.com".to_string()),
            hourly_rate: Some(3500),
            ..UpdateProfileRequest::default()
        };

        let (account, provider) = AccountService::profile_changes(Role::Psychologist, &edit).unwrap();
        assert_eq!(account["name"], "Dr. Sara");
        assert_eq!(account["email"], "sara@example.com");
        assert_eq!(provider["name"], "Dr. Sara");
        assert_eq!(provider["hourly_rate"], 3500);
        assert!(!provider.contains_key("bio"));
    }

    #[test]
    fn clients_cannot_edit_provider_fields() {
        let edit = UpdateProfileRequest {
            bio: Some("Ten years of practice".to_string()),
            ..UpdateProfileRequest::default()
        };
        assert_matches!(
            AccountService::profile_changes(Role::User, &edit),
            Err(AuthError::NotAProvider)
        );
    }

    #[test]
    fn empty_or_invalid_profile_edits_are_rejected() {
        assert_matches!(
            AccountService::profile_changes(Role::User, &UpdateProfileRequest::default()),
            Err(AuthError::Validation(msg)) if msg == "No profile fields provided"
        );

        let blank_name = UpdateProfileRequest {
            name: Some("   ".to_string()),
            ..UpdateProfileRequest::default()
        };
        assert_matches!(
            AccountService::profile_changes(Role::User, &blank_name),
            Err(AuthError::Validation(_))
        );

        let bad_email = UpdateProfileRequest {
            email: Some("nobody".to_string()),
            ..UpdateProfileRequest::default()
        };
        assert_matches!(
            AccountService::profile_changes(Role::User, &bad_email),
            Err(AuthError::Validation(msg)) if msg == "Invalid email address"
        );
    }

    #[test]
    fn email_shape_is_compiled_once() {
        let first = email_shape().map(|shape| shape as *const Regex);
        let second = email_shape().map(|shape| shape as *const Regex);
        assert!(first.is_some());
        assert_eq!(first, second);
        assert!(is_email("a@b.co"));
        assert!(!is_email("a@b"));
    }

    #[test]
    fn bad_email_is_rejected() {
        let mut req = request(None, "secret123");
        req.email = "not-an-email".to_string();
        assert_matches!(
            AccountService::validate_registration(&req),
            Err(AuthError::Validation(msg)) if msg == "Invalid email address"
        );
    }
}
