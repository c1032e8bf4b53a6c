use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::supabase::DatabaseError;
use shared_models::auth::{Account, Role};
use shared_models::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    pub specialization: Option<String>,
    #[serde(alias = "hourlyRate")]
    pub hourly_rate: Option<i64>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(alias = "refreshToken")]
    pub refresh_token: String,
}

/// Partial profile edit. Absent fields are left unchanged; the provider
/// fields apply to psychologists only.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default, alias = "hourlyRate")]
    pub hourly_rate: Option<i64>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl UpdateProfileRequest {
    pub fn touches_provider_profile(&self) -> bool {
        self.specialization.is_some() || self.hourly_rate.is_some() || self.bio.is_some()
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: Account,
}

pub const DEFAULT_HOURLY_RATE: i64 = 2000;
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Admin accounts cannot be self-registered")]
    RoleNotAllowed,

    #[error("Only psychologists have a provider profile")]
    NotAProvider,

    #[error("Account not found")]
    AccountNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken | AuthError::RoleNotAllowed | AuthError::Validation(_) => {
                AppError::ValidationError(err.to_string())
            }
            AuthError::NotAProvider => AppError::Forbidden(err.to_string()),
            AuthError::AccountNotFound => AppError::NotFound(err.to_string()),
            AuthError::InvalidCredentials => AppError::Unauthorized(err.to_string()),
            AuthError::Hashing(msg) => AppError::Internal(msg),
            AuthError::Database(db) => db.into(),
        }
    }
}
