//! Test events — builders with sensible defaults.

use chrono::Utc;
use strata_core::event::{AggregateRef, Event, EventMetadata};
use uuid::Uuid;

/// Build an event for `aggregate_id` at `revision` carrying `data`.
///
/// The event id and provenance ids are fresh v4 UUIDs and the timestamp is
/// the current time at full precision.
#[must_use]
pub fn make_event(aggregate_id: Uuid, revision: i64, data: serde_json::Value) -> Event {
    let correlation_id = Uuid::new_v4();
    Event {
        id: Uuid::new_v4(),
        name: "TestEvent".to_owned(),
        aggregate: AggregateRef {
            id: aggregate_id,
            name: "TestAggregate".to_owned(),
        },
        data,
        metadata: EventMetadata {
            revision,
            timestamp: Utc::now(),
            correlation_id,
            causation_id: correlation_id,
        },
    }
}
