//! Test stores — in-memory and failing repository implementations.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use strata_core::config::StoreConfig;
use strata_core::error::StoreError;
use strata_core::event::{Event, RecordedEvent};
use strata_core::policy::{SnapshotPolicy, validate_batch};
use strata_core::range::{PositionRange, RevisionRange};
use strata_core::repository::{EventRepository, SnapshotRepository};
use strata_core::snapshot::Snapshot;
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    log: Vec<RecordedEvent>,
    snapshots: HashMap<Uuid, Snapshot>,
    next_position: i64,
}

impl State {
    fn put_snapshot(&mut self, snapshot: Snapshot) {
        match self.snapshots.get(&snapshot.aggregate_id) {
            Some(existing) if existing.revision >= snapshot.revision => {}
            _ => {
                self.snapshots.insert(snapshot.aggregate_id, snapshot);
            }
        }
    }
}

/// An event store held entirely in memory.
///
/// Follows the same rules as the PostgreSQL store: whole-batch validation,
/// all-or-nothing appends, `Conflict` on a taken revision or event id,
/// positions starting at 1, and monotonic snapshot upserts.
#[derive(Debug)]
pub struct InMemoryEventStore {
    policy: SnapshotPolicy,
    state: Mutex<State>,
}

impl InMemoryEventStore {
    /// Create an empty store using the cadence from `config`.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            policy: SnapshotPolicy::from(config),
            state: Mutex::new(State {
                next_position: 1,
                ..State::default()
            }),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Infrastructure("in-memory store lock poisoned".into()))
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

#[async_trait]
impl EventRepository for InMemoryEventStore {
    async fn append(&self, events: Vec<Event>) -> Result<Vec<Event>, StoreError> {
        validate_batch(&events)?;

        let mut state = self.state()?;

        let mut taken_revisions: HashSet<(Uuid, i64)> = state
            .log
            .iter()
            .map(|r| (r.event.aggregate_id(), r.event.revision()))
            .collect();
        let mut taken_ids: HashSet<Uuid> = state.log.iter().map(|r| r.event.id).collect();
        for event in &events {
            if !taken_revisions.insert((event.aggregate_id(), event.revision()))
                || !taken_ids.insert(event.id)
            {
                return Err(StoreError::Conflict {
                    aggregate_id: event.aggregate_id(),
                    event_id: event.id,
                    revision: event.revision(),
                });
            }
        }

        for event in &events {
            let position = state.next_position;
            state.next_position += 1;
            state.log.push(RecordedEvent {
                position,
                event: event.clone(),
            });
        }
        for snapshot in self.policy.snapshots_for(&events) {
            state.put_snapshot(snapshot);
        }

        Ok(events)
    }

    async fn events_by_aggregate(
        &self,
        aggregate_id: Uuid,
        range: RevisionRange,
    ) -> Result<Vec<RecordedEvent>, StoreError> {
        let state = self.state()?;
        let mut events: Vec<RecordedEvent> = state
            .log
            .iter()
            .filter(|r| r.event.aggregate_id() == aggregate_id && range.contains(r.event.revision()))
            .cloned()
            .collect();
        events.sort_by_key(|r| r.event.revision());
        Ok(events)
    }

    async fn last_event(&self, aggregate_id: Uuid) -> Result<RecordedEvent, StoreError> {
        let state = self.state()?;
        state
            .log
            .iter()
            .filter(|r| r.event.aggregate_id() == aggregate_id)
            .max_by_key(|r| r.event.revision())
            .cloned()
            .ok_or(StoreError::AggregateNotFound(aggregate_id))
    }

    async fn all_events(&self, range: PositionRange) -> Result<Vec<RecordedEvent>, StoreError> {
        let state = self.state()?;
        Ok(state
            .log
            .iter()
            .filter(|r| range.contains(r.position))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SnapshotRepository for InMemoryEventStore {
    async fn save_snapshot(
        &self,
        aggregate_id: Uuid,
        revision: i64,
        data: serde_json::Value,
    ) -> Result<(), StoreError> {
        self.state()?.put_snapshot(Snapshot {
            aggregate_id,
            revision,
            data,
        });
        Ok(())
    }

    async fn snapshot(&self, aggregate_id: Uuid) -> Result<Snapshot, StoreError> {
        self.state()?
            .snapshots
            .get(&aggregate_id)
            .cloned()
            .ok_or(StoreError::SnapshotNotFound(aggregate_id))
    }
}

/// A store that always reports the backend as unreachable. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

fn unavailable() -> StoreError {
    StoreError::Unavailable("connection refused".into())
}

#[async_trait]
impl EventRepository for FailingEventStore {
    async fn append(&self, _events: Vec<Event>) -> Result<Vec<Event>, StoreError> {
        Err(unavailable())
    }

    async fn events_by_aggregate(
        &self,
        _aggregate_id: Uuid,
        _range: RevisionRange,
    ) -> Result<Vec<RecordedEvent>, StoreError> {
        Err(unavailable())
    }

    async fn last_event(&self, _aggregate_id: Uuid) -> Result<RecordedEvent, StoreError> {
        Err(unavailable())
    }

    async fn all_events(&self, _range: PositionRange) -> Result<Vec<RecordedEvent>, StoreError> {
        Err(unavailable())
    }
}

#[async_trait]
impl SnapshotRepository for FailingEventStore {
    async fn save_snapshot(
        &self,
        _aggregate_id: Uuid,
        _revision: i64,
        _data: serde_json::Value,
    ) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn snapshot(&self, _aggregate_id: Uuid) -> Result<Snapshot, StoreError> {
        Err(unavailable())
    }
}
