use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::jwt::{validate_access_token, TokenError};
use crate::session::rotate_session;

pub const REFRESH_TOKEN_HEADER: &str = "refresh-token";
pub const NEW_ACCESS_TOKEN_HEADER: &str = "x-access-token";
pub const NEW_REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

pub fn bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_value = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header format".to_string()))?;

    match auth_value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(AppError::Unauthorized("Invalid authorization header format".to_string())),
    }
}

// Missing credential -> 401, bad credential -> 403. A stale access token
// accompanied by a refresh-token header is rotated inline.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;

    match validate_access_token(&token, &config) {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            Ok(next.run(request).await)
        }
        Err(TokenError::Expired) => {
            let refresh_token = request
                .headers()
                .get(REFRESH_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| AppError::Forbidden("Token expired".to_string()))?;

            let (_, pair) = rotate_session(&config, &refresh_token).await?;
            let ctx = validate_access_token(&pair.access_token, &config)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            debug!("Continuing request for {} with rotated tokens", ctx.user_id);
            request.extensions_mut().insert(ctx);

            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&pair.access_token) {
                headers.insert(NEW_ACCESS_TOKEN_HEADER, value);
            }
            if let Ok(value) = HeaderValue::from_str(&pair.refresh_token) {
                headers.insert(NEW_REFRESH_TOKEN_HEADER, value);
            }
            Ok(response)
        }
        Err(e) => Err(AppError::Forbidden(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn bearer_token_requires_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Token abc"));
        assert_matches!(bearer_token(&headers), Err(AppError::Unauthorized(_)));

        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc");
    }

    #[test]
    fn missing_header_is_unauthorized() {
        assert_matches!(
            bearer_token(&HeaderMap::new()),
            Err(AppError::Unauthorized(msg)) if msg == "Missing authorization header"
        );
    }
}
