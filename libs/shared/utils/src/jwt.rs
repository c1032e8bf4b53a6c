use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthContext, JwtClaims, JwtHeader, TokenPair, TokenSubject, TokenUse};

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("JWT secret is not set")]
    MissingSecret,

    #[error("Invalid token format")]
    Malformed,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid claims format")]
    InvalidClaims,

    #[error("Token expired")]
    Expired,

    #[error("Token used for the wrong purpose")]
    WrongUse,
}

fn signer(jwt_secret: &str) -> Result<HmacSha256, TokenError> {
    if jwt_secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }
    HmacSha256::new_from_slice(jwt_secret.as_bytes()).map_err(|_| TokenError::MissingSecret)
}

/// Verifies the signature and `exp` of an HS256 token and returns its claims.
pub fn decode_token(token: &str, jwt_secret: &str, now: i64) -> Result<JwtClaims, TokenError> {
    let mut mac = signer(jwt_secret)?;

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::Malformed);
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];

    let signature = URL_SAFE_NO_PAD.decode(parts[2]).map_err(|e| {
        debug!("Failed to decode signature: {}", e);
        TokenError::Malformed
    })?;

    mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());
    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err(TokenError::InvalidSignature);
    }

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| TokenError::InvalidClaims)?;
    let claims: JwtClaims = serde_json::from_slice(&claims_bytes).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        TokenError::InvalidClaims
    })?;

    if claims.exp < now {
        debug!("Token expired at {} (now: {})", claims.exp, now);
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

/// Access tokens older than the configured TTL count as expired even when
/// their `exp` is still ahead.
pub fn validate_access_token(token: &str, config: &AppConfig) -> Result<AuthContext, TokenError> {
    let now = Utc::now().timestamp();
    let claims = decode_token(token, &config.jwt_secret, now)?;

    if claims.token_use != TokenUse::Access {
        return Err(TokenError::WrongUse);
    }
    if now - claims.iat > config.access_token_ttl_minutes * 60 {
        debug!("Access token issued at {} is stale", claims.iat);
        return Err(TokenError::Expired);
    }

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| TokenError::InvalidClaims)?;
    let expires_at = Utc
        .timestamp_opt(claims.exp, 0)
        .single()
        .ok_or(TokenError::InvalidClaims)?;

    debug!("Token validated successfully for user: {}", user_id);
    Ok(AuthContext {
        user_id,
        role: claims.role,
        name: claims.name,
        email: claims.email,
        expires_at,
    })
}

pub fn validate_refresh_token(token: &str, jwt_secret: &str) -> Result<JwtClaims, TokenError> {
    let claims = decode_token(token, jwt_secret, Utc::now().timestamp())?;
    if claims.token_use != TokenUse::Refresh {
        return Err(TokenError::WrongUse);
    }
    Ok(claims)
}

pub fn issue_token(
    subject: &TokenSubject,
    token_use: TokenUse,
    ttl: Duration,
    jwt_secret: &str,
) -> Result<String, TokenError> {
    let mut mac = signer(jwt_secret)?;
    let now = Utc::now();

    let header = JwtHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let claims = JwtClaims {
        sub: subject.user_id.to_string(),
        name: subject.name.clone(),
        email: subject.email.clone(),
        role: subject.role,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        token_use,
    };

    let header_json = serde_json::to_vec(&header).map_err(|_| TokenError::InvalidClaims)?;
    let claims_json = serde_json::to_vec(&claims).map_err(|_| TokenError::InvalidClaims)?;
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );

    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
}

pub fn issue_token_pair(subject: &TokenSubject, config: &AppConfig) -> Result<TokenPair, TokenError> {
    Ok(TokenPair {
        access_token: issue_token(
            subject,
            TokenUse::Access,
            Duration::minutes(config.access_token_ttl_minutes),
            &config.jwt_secret,
        )?,
        refresh_token: issue_token(
            subject,
            TokenUse::Refresh,
            Duration::days(config.refresh_token_ttl_days),
            &config.jwt_secret,
        )?,
    })
}
