use crate::application::ports::Notifier;
use crate::domain::entities::Notification;
use crate::shared::error::AppError;
use tokio::sync::broadcast;

/// Fans notifications out to UI subscribers. Having no subscriber is not an
/// error; the notification is simply dropped.
#[derive(Clone)]
pub struct ChannelNotifier {
    sender: broadcast::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for ChannelNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) -> Result<(), AppError> {
        if self.sender.send(notification).is_err() {
            tracing::trace!(target: "offline::notify", "no notification subscribers");
        }
        Ok(())
    }
}
