use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::models::Notification;
use crate::services::notifier::{HttpRelayNotifier, LogOnlyNotifier, Notifier};

/// Fire-and-forget delivery. Failures are logged, never returned.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        match &config.notification_webhook_url {
            Some(url) => Self::new(Arc::new(HttpRelayNotifier::new(url.clone()))),
            None => Self::new(Arc::new(LogOnlyNotifier)),
        }
    }

    /// Spawns the delivery; the returned handle is only useful to tests.
    pub fn dispatch(&self, notification: Notification) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);

        tokio::spawn(async move {
            match notifier.deliver(&notification).await {
                Ok(()) => debug!(
                    "Delivered {} notification to {}",
                    notification.template, notification.recipient
                ),
                Err(e) => warn!(
                    "Failed to deliver {} notification to {}: {}",
                    notification.template, notification.recipient, e
                ),
            }
        })
    }
}
