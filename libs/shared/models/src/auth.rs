use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub token_use: TokenUse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    Psychologist,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Psychologist => write!(f, "Psychologist"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Role::User),
            "Psychologist" => Ok(Role::Psychologist),
            "Admin" => Ok(Role::Admin),
            other => Err(AppError::ValidationError(format!("Unknown role: {}", other))),
        }
    }
}

/// Operations gated on the caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    BookAppointment,
    CancelAppointment,
    CompleteAppointment,
    ViewProviderSchedule,
    ViewProviderStats,
    ViewAnyAppointment,
    LogMood,
    UseAssistant,
    ViewOwnAnalytics,
    MakePayment,
}

impl Capability {
    fn denial_message(&self) -> &'static str {
        match self {
            Capability::CompleteAppointment => "Only psychologists can complete appointments",
            Capability::ViewProviderSchedule | Capability::ViewProviderStats => {
                "Only psychologists can access provider data"
            }
            Capability::ViewAnyAppointment => "Admin access required",
            _ => "Not permitted for this role",
        }
    }
}

const USER_CAPABILITIES: &[Capability] = &[
    Capability::BookAppointment,
    Capability::CancelAppointment,
    Capability::LogMood,
    Capability::UseAssistant,
    Capability::ViewOwnAnalytics,
    Capability::MakePayment,
];

const PSYCHOLOGIST_CAPABILITIES: &[Capability] = &[
    Capability::BookAppointment,
    Capability::CancelAppointment,
    Capability::CompleteAppointment,
    Capability::ViewProviderSchedule,
    Capability::ViewProviderStats,
    Capability::LogMood,
    Capability::UseAssistant,
    Capability::ViewOwnAnalytics,
    Capability::MakePayment,
];

const ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::BookAppointment,
    Capability::CancelAppointment,
    Capability::ViewAnyAppointment,
    Capability::LogMood,
    Capability::UseAssistant,
    Capability::ViewOwnAnalytics,
    Capability::MakePayment,
];

impl Role {
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::User => USER_CAPABILITIES,
            Role::Psychologist => PSYCHOLOGIST_CAPABILITIES,
            Role::Admin => ADMIN_CAPABILITIES,
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Verified caller identity, produced by the auth gate and passed into services.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthContext {
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.role.can(capability) {
            Ok(())
        } else {
            tracing::debug!("User {} ({}) lacks {:?}", self.user_id, self.role, capability);
            Err(AppError::Forbidden(capability.denial_message().to_string()))
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }
}

/// Stored account row. The password hash is never serialized back out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    #[serde(default, skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Identity fields embedded into issued tokens.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&Account> for TokenSubject {
    fn from(account: &Account) -> Self {
        Self {
            user_id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn context(role: Role) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            role,
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn only_psychologists_complete_appointments() {
        assert!(context(Role::Psychologist).require(Capability::CompleteAppointment).is_ok());
        assert_matches!(
            context(Role::User).require(Capability::CompleteAppointment),
            Err(AppError::Forbidden(msg)) if msg == "Only psychologists can complete appointments"
        );
        assert_matches!(
            context(Role::Admin).require(Capability::CompleteAppointment),
            Err(AppError::Forbidden(_))
        );
    }

    #[test]
    fn every_role_can_book_and_log_mood() {
        for role in [Role::User, Role::Psychologist, Role::Admin] {
            assert!(role.can(Capability::BookAppointment));
            assert!(role.can(Capability::LogMood));
        }
    }

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!("Psychologist".parse::<Role>().unwrap(), Role::Psychologist);
        assert_eq!(Role::Admin.to_string(), "Admin");
        assert!("doctor".parse::<Role>().is_err());
    }
}
