use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthContext, Role};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", Role::User)
    }
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email: email.to_string(),
            role,
        }
    }

    pub fn user(email: &str) -> Self {
        Self::new(email, Role::User)
    }

    pub fn psychologist(email: &str) -> Self {
        Self::new(email, Role::Psychologist)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, Role::Admin)
    }

    pub fn to_context(&self) -> AuthContext {
        AuthContext {
            user_id: self.id,
            role: self.role,
            name: self.name.clone(),
            email: self.email.clone(),
            expires_at: Utc::now() + Duration::minutes(15),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    fn sign(payload: serde_json::Value, secret: &str) -> String {
        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    fn token_with(user: &TestUser, secret: &str, issued_minutes_ago: i64, exp_hours: i64, token_use: &str) -> String {
        let now = Utc::now();
        let iat = now - Duration::minutes(issued_minutes_ago);
        let exp = now + Duration::hours(exp_hours);

        Self::sign(
            json!({
                "sub": user.id,
                "name": user.name,
                "email": user.email,
                "role": user.role,
                "iat": iat.timestamp(),
                "exp": exp.timestamp(),
                "token_use": token_use
            }),
            secret,
        )
    }

    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        Self::token_with(user, secret, 0, exp_hours.unwrap_or(1), "access")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::token_with(user, secret, 0, -1, "access")
    }

    /// Signature and `exp` are fine but `iat` is past the access TTL.
    pub fn create_stale_token(user: &TestUser, secret: &str) -> String {
        Self::token_with(user, secret, 20, 1, "access")
    }

    pub fn create_refresh_token(user: &TestUser, secret: &str) -> String {
        Self::token_with(user, secret, 0, 24 * 7, "refresh")
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(1))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn account_response(user: &TestUser, password_hash: &str, refresh_token: Option<&str>) -> serde_json::Value {
        json!({
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "password_hash": password_hash,
            "role": user.role,
            "refresh_token": refresh_token,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn psychologist_response(user_id: Uuid, hourly_rate: i64) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "name": "Dr. Test",
            "specialization": "Anxiety",
            "hourly_rate": hourly_rate,
            "bio": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(
        id: Uuid,
        user_id: Uuid,
        psychologist_id: Uuid,
        date: &str,
        time_slot: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": user_id,
            "psychologist_id": psychologist_id,
            "date": date,
            "time_slot": time_slot,
            "reason": null,
            "status": status,
            "payment_id": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn mood_entry_response(user_id: Uuid, sentiment: &str, created_at: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "sentiment": sentiment,
            "created_at": created_at
        })
    }

    pub fn exchange_response(user_id: Uuid, session_id: &str, message: &str, response: &str, created_at: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "session_id": session_id,
            "message": message,
            "response": response,
            "sentiment": "neutral",
            "created_at": created_at
        })
    }

    pub fn payment_response(id: Uuid, user_id: Uuid, appointment_id: Uuid, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": user_id,
            "appointment_id": appointment_id,
            "amount": 250000,
            "currency": "pkr",
            "processor": "Stripe",
            "processor_reference": "pi_test_123",
            "status": status,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn unique_violation_response(constraint: &str) -> serde_json::Value {
        json!({
            "code": "23505",
            "message": format!("duplicate key value violates unique constraint \"{}\"", constraint),
            "details": null,
            "hint": null
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{validate_access_token, TokenError};

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_service_key, "test-service-key");
        assert!(!app_config.jwt_secret.is_empty());
    }

    #[test]
    fn test_tokens_match_gate_expectations() {
        let config = TestConfig::default().to_app_config();
        let user = TestUser::psychologist("doc@example.com");

        let ctx = validate_access_token(
            &JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1)),
            &config,
        )
        .unwrap();
        assert_eq!(ctx.user_id, user.id);
        assert_eq!(ctx.role, Role::Psychologist);

        assert_eq!(
            validate_access_token(&JwtTestUtils::create_stale_token(&user, &config.jwt_secret), &config).unwrap_err(),
            TokenError::Expired
        );
        assert_eq!(
            validate_access_token(&JwtTestUtils::create_expired_token(&user, &config.jwt_secret), &config).unwrap_err(),
            TokenError::Expired
        );
    }
}
