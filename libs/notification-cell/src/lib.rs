pub mod models;
pub mod services;

pub use models::{Notification, NotificationError, NotificationTemplate};
pub use services::dispatcher::NotificationDispatcher;
pub use services::notifier::{HttpRelayNotifier, LogOnlyNotifier, Notifier};
