use crate::domain::entities::Notification;
use crate::shared::error::AppError;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Surfaces human-readable status to the host UI. Delivery is best-effort:
/// callers log failures and carry on.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), AppError>;
}

/// Sends `notification`, logging instead of propagating an error or a panic
/// raised by the notifier.
pub(crate) fn notify_best_effort(notifier: &dyn Notifier, notification: Notification) {
    let title = notification.title.clone();
    match catch_unwind(AssertUnwindSafe(|| notifier.notify(notification))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::warn!(
                target: "offline::notify",
                error = %err,
                title = %title,
                "failed to deliver notification"
            );
        }
        Err(_) => {
            tracing::error!(
                target: "offline::notify",
                title = %title,
                "notifier panicked while delivering notification"
            );
        }
    }
}
