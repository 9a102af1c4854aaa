use crate::application::ports::Notifier;
use crate::domain::entities::{Notification, Severity};
use crate::shared::error::AppError;

/// Writes notifications to the log at a level matching their severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), AppError> {
        let Notification {
            severity,
            title,
            description,
        } = notification;
        match severity {
            Severity::Error => {
                tracing::error!(target: "offline::notify", %title, %description)
            }
            Severity::Warning => {
                tracing::warn!(target: "offline::notify", %title, %description)
            }
            Severity::Success | Severity::Info => {
                tracing::info!(target: "offline::notify", %severity, %title, %description)
            }
        }
        Ok(())
    }
}
