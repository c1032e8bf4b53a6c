pub mod dispatcher;
pub mod notifier;
