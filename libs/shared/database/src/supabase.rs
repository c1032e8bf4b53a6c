use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Unique constraint violated: {message}")]
    UniqueViolation {
        constraint: Option<String>,
        message: String,
    },

    #[error("Referenced row does not exist: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl DatabaseError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DatabaseError::UniqueViolation { .. })
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation { message, .. } => AppError::Conflict(message),
            DatabaseError::ForeignKeyViolation { message } => AppError::ValidationError(message),
            DatabaseError::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::Database(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

const UNIQUE_VIOLATION_CODE: &str = "23505";
const FOREIGN_KEY_VIOLATION_CODE: &str = "23503";

/// Reads the constraint name out of a Postgres duplicate-key message.
fn constraint_name(message: &str) -> Option<String> {
    let start = message.find("constraint \"")? + "constraint \"".len();
    let rest = &message[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn classify_error(status: StatusCode, body: &str) -> DatabaseError {
    let parsed: Option<PostgrestError> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|p| p.code.clone());
    let message = parsed
        .and_then(|p| p.message)
        .unwrap_or_else(|| body.to_string());

    match code.as_deref() {
        Some(UNIQUE_VIOLATION_CODE) => {
            return DatabaseError::UniqueViolation {
                constraint: constraint_name(&message),
                message,
            };
        }
        Some(FOREIGN_KEY_VIOLATION_CODE) => {
            return DatabaseError::ForeignKeyViolation { message };
        }
        None if status == StatusCode::CONFLICT => {
            return DatabaseError::UniqueViolation {
                constraint: constraint_name(&message),
                message,
            };
        }
        _ => {}
    }

    match status.as_u16() {
        401 | 403 => DatabaseError::Auth(message),
        404 => DatabaseError::NotFound(message),
        other => DatabaseError::Api { status: other, message },
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self, return_representation: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();

        match HeaderValue::from_str(&self.service_key) {
            Ok(value) => {
                headers.insert("apikey", value);
            }
            Err(_) => warn!("Supabase service key contains invalid header characters"),
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.service_key)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if return_representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let wants_rows = matches!(method, Method::POST | Method::PATCH | Method::DELETE);
        let headers = self.get_headers(wants_rows);

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            let err = classify_error(status, &error_text);
            if err.is_unique_violation() {
                debug!("Store rejected duplicate row: {}", error_text);
            } else {
                error!("API error ({}): {}", status, error_text);
            }
            return Err(err);
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Runs a filtered select and returns every matching row.
    pub async fn select<T>(&self, path: &str) -> Result<Vec<T>, DatabaseError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, path, None).await
    }

    /// Inserts one row and returns it as stored.
    pub async fn insert<T>(&self, table: &str, row: Value) -> Result<T, DatabaseError>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/{}", table);
        let mut rows: Vec<T> = self.request(Method::POST, &path, Some(row)).await?;
        if rows.is_empty() {
            return Err(DatabaseError::Api {
                status: 200,
                message: format!("Insert into {} returned no rows", table),
            });
        }
        Ok(rows.remove(0))
    }

    /// Conditional update: only rows matching the filter in `path` change.
    /// An empty result means nothing matched.
    pub async fn update<T>(&self, path: &str, changes: Value) -> Result<Vec<T>, DatabaseError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, path, Some(changes)).await
    }

    /// Deletes the rows matching the filter in `path` and returns them.
    pub async fn delete<T>(&self, path: &str) -> Result<Vec<T>, DatabaseError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::DELETE, path, None).await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn duplicate_key_is_a_unique_violation() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint \"appointments_provider_slot_active_idx\""}"#;
        let err = classify_error(StatusCode::CONFLICT, body);
        assert_matches!(
            err,
            DatabaseError::UniqueViolation { constraint: Some(name), .. } if name == "appointments_provider_slot_active_idx"
        );
    }

    #[test]
    fn sqlstate_alone_is_enough() {
        let body = r#"{"code":"23505","message":"duplicate key"}"#;
        let err = classify_error(StatusCode::BAD_REQUEST, body);
        assert!(err.is_unique_violation());
    }

    #[test]
    fn foreign_key_conflict_is_not_a_duplicate() {
        let body = r#"{"code":"23503","message":"insert or update on table \"appointments\" violates foreign key constraint"}"#;
        assert_matches!(
            classify_error(StatusCode::CONFLICT, body),
            DatabaseError::ForeignKeyViolation { .. }
        );
    }

    #[test]
    fn other_statuses_are_classified() {
        assert_matches!(classify_error(StatusCode::UNAUTHORIZED, "nope"), DatabaseError::Auth(_));
        assert_matches!(classify_error(StatusCode::NOT_FOUND, "gone"), DatabaseError::NotFound(_));
        assert_matches!(
            classify_error(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            DatabaseError::Api { status: 500, .. }
        );
    }
}
