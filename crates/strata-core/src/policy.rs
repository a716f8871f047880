//! Append rules shared by every backend.
//!
//! A batch is validated as a whole before any backend round trip, so a bad
//! revision anywhere in the batch rejects all of it.

use std::num::NonZeroU32;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::event::Event;
use crate::range::MAX_BOUND;
use crate::snapshot::Snapshot;

/// Highest revision an event may carry.
pub const MAX_REVISION: i64 = MAX_BOUND;

/// Checks that a batch is non-empty and every revision is in `1..=MAX_REVISION`.
///
/// # Errors
///
/// Returns `StoreError::InvalidArgument` naming the first offending event.
pub fn validate_batch(events: &[Event]) -> Result<(), StoreError> {
    if events.is_empty() {
        return Err(StoreError::InvalidArgument(
            "at least one event required".into(),
        ));
    }

    for (index, event) in events.iter().enumerate() {
        let revision = event.revision();
        if revision < 1 {
            return Err(StoreError::InvalidArgument(format!(
                "event {} at index {index}: revision must be greater than 0, got {revision}",
                event.id
            )));
        }
        if revision > MAX_REVISION {
            return Err(StoreError::InvalidArgument(format!(
                "event {} at index {index}: revision {revision} exceeds {MAX_REVISION}",
                event.id
            )));
        }
    }

    Ok(())
}

/// Decides which appended events trigger a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotPolicy {
    interval: NonZeroU32,
}

impl SnapshotPolicy {
    /// Snapshot every `interval` revisions.
    #[must_use]
    pub fn every(interval: NonZeroU32) -> Self {
        Self { interval }
    }

    /// Returns `true` when `revision` is an exact multiple of the interval.
    #[must_use]
    pub fn should_snapshot(&self, revision: i64) -> bool {
        revision > 0 && revision % i64::from(self.interval.get()) == 0
    }

    /// Snapshots to capture for an appended batch, in batch order.
    #[must_use]
    pub fn snapshots_for(&self, events: &[Event]) -> Vec<Snapshot> {
        events
            .iter()
            .filter(|event| self.should_snapshot(event.revision()))
            .map(|event| Snapshot {
                aggregate_id: event.aggregate_id(),
                revision: event.revision(),
                data: event.data.clone(),
            })
            .collect()
    }
}

impl From<&StoreConfig> for SnapshotPolicy {
    fn from(config: &StoreConfig) -> Self {
        Self::every(config.snapshot_interval())
    }
}
