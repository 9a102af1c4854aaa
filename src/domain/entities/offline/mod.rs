pub mod connectivity_state;
pub mod drain_report;
pub mod notification;
pub mod pending_action;

pub use connectivity_state::{ConnectivityEvent, ConnectivitySignal, ConnectivityState};
pub use drain_report::{DrainOutcome, DrainReport};
pub use notification::{Notification, Severity};
pub use pending_action::{PendingAction, PendingActionDraft};
