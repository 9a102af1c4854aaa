pub mod offline;

pub use offline::{
    ConnectivityEvent, ConnectivitySignal, ConnectivityState, DrainOutcome, DrainReport,
    Notification, PendingAction, PendingActionDraft, Severity,
};
