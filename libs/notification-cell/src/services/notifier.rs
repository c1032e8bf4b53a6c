use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use crate::models::{Notification, NotificationError};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// One delivery attempt. No retries.
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Posts notifications to an HTTP mail relay.
pub struct HttpRelayNotifier {
    client: Client,
    relay_url: String,
}

impl HttpRelayNotifier {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            relay_url: relay_url.into(),
        }
    }
}

#[async_trait]
impl Notifier for HttpRelayNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        debug!("Relaying {} to {}", notification.template, notification.recipient);

        let response = self
            .client
            .post(&self.relay_url)
            .json(&json!({
                "to": notification.recipient,
                "subject": notification.template.subject(),
                "template": notification.template,
                "data": notification.data,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Used when no relay is configured.
pub struct LogOnlyNotifier;

#[async_trait]
impl Notifier for LogOnlyNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        info!(
            "No notification relay configured; dropping {} for {}",
            notification.template, notification.recipient
        );
        Ok(())
    }
}
