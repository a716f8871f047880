//! Event and snapshot repository abstractions.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::event::{Event, RecordedEvent};
use crate::range::{PositionRange, RevisionRange};
use crate::snapshot::Snapshot;

/// Repository trait for appending and reading events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Append a batch of events, possibly spanning several aggregates.
    ///
    /// Callers supply the next revision themselves; a revision that is
    /// already taken surfaces as `StoreError::Conflict`. Events whose
    /// revision is a multiple of the snapshot interval are snapshotted.
    /// Returns the input events on success.
    async fn append(&self, events: Vec<Event>) -> Result<Vec<Event>, StoreError>;

    /// Load an aggregate's events within `range`, ordered by revision.
    async fn events_by_aggregate(
        &self,
        aggregate_id: Uuid,
        range: RevisionRange,
    ) -> Result<Vec<RecordedEvent>, StoreError>;

    /// Load the highest-revision event of an aggregate.
    async fn last_event(&self, aggregate_id: Uuid) -> Result<RecordedEvent, StoreError>;

    /// Load the whole log within `range`, ordered by global position.
    async fn all_events(&self, range: PositionRange) -> Result<Vec<RecordedEvent>, StoreError>;
}

/// Repository trait for the latest snapshot per aggregate.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Store a snapshot unless one at an equal or newer revision exists.
    async fn save_snapshot(
        &self,
        aggregate_id: Uuid,
        revision: i64,
        data: serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Load the stored snapshot of an aggregate.
    async fn snapshot(&self, aggregate_id: Uuid) -> Result<Snapshot, StoreError>;
}
