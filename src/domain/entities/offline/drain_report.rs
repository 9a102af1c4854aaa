use crate::domain::value_objects::PendingActionId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Overall result of one drain pass, used to pick the summary notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainOutcome {
    /// Nothing was attempted (every snapshot entry was removed before its turn).
    Empty,
    AllSucceeded,
    /// Every attempted action exhausted its retries.
    AllFailed,
    /// At least one success alongside failures.
    Partial,
    /// No success, at least one action left for a later pass.
    RetryPending,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainReport {
    pub succeeded: Vec<PendingActionId>,
    pub retryable: Vec<PendingActionId>,
    pub abandoned: Vec<PendingActionId>,
    pub skipped: usize,
    /// Actions left untouched because connectivity dropped mid-pass.
    #[serde(default)]
    pub deferred: usize,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl DrainReport {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.retryable.len() + self.abandoned.len()
    }

    pub fn interrupted(&self) -> bool {
        self.deferred > 0
    }

    /// Folds a follow-up pass into this report.
    pub fn absorb(&mut self, other: DrainReport) {
        self.succeeded.extend(other.succeeded);
        self.retryable.extend(other.retryable);
        self.abandoned.extend(other.abandoned);
        self.skipped += other.skipped;
        self.deferred = other.deferred;
        self.duration += other.duration;
    }

    pub fn outcome(&self) -> DrainOutcome {
        let succeeded = self.succeeded.len();
        let retryable = self.retryable.len();
        let abandoned = self.abandoned.len();

        match (succeeded, retryable, abandoned) {
            (0, 0, 0) => DrainOutcome::Empty,
            (_, 0, 0) => DrainOutcome::AllSucceeded,
            (0, 0, _) => DrainOutcome::AllFailed,
            (0, _, _) => DrainOutcome::RetryPending,
            _ => DrainOutcome::Partial,
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u128::from(u64::MAX)) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<PendingActionId> {
        (0..n).map(|_| PendingActionId::generate()).collect()
    }

    fn report(s: usize, r: usize, a: usize) -> DrainReport {
        DrainReport {
            succeeded: ids(s),
            retryable: ids(r),
            abandoned: ids(a),
            ..DrainReport::default()
        }
    }

    #[test]
    fn outcome_covers_every_tally_shape() {
        assert_eq!(report(0, 0, 0).outcome(), DrainOutcome::Empty);
        assert_eq!(report(3, 0, 0).outcome(), DrainOutcome::AllSucceeded);
        assert_eq!(report(0, 0, 2).outcome(), DrainOutcome::AllFailed);
        assert_eq!(report(0, 2, 1).outcome(), DrainOutcome::RetryPending);
        assert_eq!(report(2, 1, 0).outcome(), DrainOutcome::Partial);
        assert_eq!(report(1, 0, 1).outcome(), DrainOutcome::Partial);
    }

    #[test]
    fn absorb_accumulates_follow_up_pass() {
        let mut first = report(1, 1, 0);
        first.skipped = 1;
        first.duration = Duration::from_millis(40);

        let mut trailing = report(2, 0, 0);
        trailing.duration = Duration::from_millis(10);
        first.absorb(trailing);

        assert_eq!(first.succeeded.len(), 3);
        assert_eq!(first.retryable.len(), 1);
        assert_eq!(first.skipped, 1);
        assert_eq!(first.duration, Duration::from_millis(50));
        assert!(!first.interrupted());
    }
}
