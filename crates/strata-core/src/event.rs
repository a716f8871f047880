//! Event data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity and type of the aggregate an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRef {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Aggregate type name.
    pub name: String,
}

/// Provenance attached to every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    /// Position within the aggregate's history, starting at 1.
    pub revision: i64,
    /// Time the producer created the event, serialized as RFC 3339 at full
    /// precision so it round-trips unchanged.
    pub timestamp: DateTime<Utc>,
    /// Correlation ID for tracing a command through its effects.
    pub correlation_id: Uuid,
    /// Causation ID linking this event to whatever caused it.
    pub causation_id: Uuid,
}

/// An immutable fact about one aggregate.
///
/// The store treats `data` and the provenance fields as opaque; only the
/// event id, the aggregate id and the revision take part in its rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Producer-assigned, globally unique identifier.
    pub id: Uuid,
    /// Event type discriminator.
    pub name: String,
    /// Owning aggregate.
    pub aggregate: AggregateRef,
    /// Arbitrary structured payload.
    pub data: serde_json::Value,
    /// Revision and provenance.
    pub metadata: EventMetadata,
}

impl Event {
    /// Returns the owning aggregate's identifier.
    #[must_use]
    pub fn aggregate_id(&self) -> Uuid {
        self.aggregate.id
    }

    /// Returns the event's revision within its aggregate.
    #[must_use]
    pub fn revision(&self) -> i64 {
        self.metadata.revision
    }
}

/// An event as persisted, with its store-assigned global position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Global, strictly increasing sequence number across all aggregates.
    pub position: i64,
    /// The event as appended.
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn sample_event() -> Event {
        Event {
            id: Uuid::new_v4(),
            name: "RequestCreated".to_owned(),
            aggregate: AggregateRef {
                id: Uuid::new_v4(),
                name: "Request".to_owned(),
            },
            data: json!({"a": 111, "b": "222"}),
            metadata: EventMetadata {
                revision: 1,
                timestamp: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
                correlation_id: Uuid::new_v4(),
                causation_id: Uuid::new_v4(),
            },
        }
    }

    #[test]
    fn test_metadata_serializes_with_camel_case_and_rfc3339_timestamp() {
        let event = sample_event();

        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["metadata"]["revision"], 1);
        assert_eq!(value["metadata"]["timestamp"], "2026-01-15T10:00:00Z");
        assert_eq!(
            value["metadata"]["correlationId"],
            event.metadata.correlation_id.to_string()
        );
        assert_eq!(
            value["metadata"]["causationId"],
            event.metadata.causation_id.to_string()
        );
        assert_eq!(value["aggregate"]["name"], "Request");
    }

    #[test]
    fn test_event_deserializes_from_producer_document() {
        let event = sample_event();
        let document = json!({
            "id": event.id,
            "name": "RequestCreated",
            "aggregate": {"id": event.aggregate.id, "name": "Request"},
            "data": {"a": 111, "b": "222"},
            "metadata": {
                "revision": 1,
                "timestamp": "2026-01-15T10:00:00Z",
                "correlationId": event.metadata.correlation_id,
                "causationId": event.metadata.causation_id,
            }
        });

        let decoded: Event = serde_json::from_value(document).unwrap();

        assert_eq!(decoded, event);
        assert_eq!(decoded.aggregate_id(), event.aggregate.id);
        assert_eq!(decoded.revision(), 1);
    }

    #[test]
    fn test_sub_millisecond_timestamp_survives_json_round_trip() {
        let mut event = sample_event();
        event.metadata.timestamp = Utc.timestamp_opt(1_768_471_200, 640_003_298).unwrap();

        let encoded = serde_json::to_string(&event).unwrap();
        let decoded: Event = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.metadata.timestamp, event.metadata.timestamp);
        assert_eq!(decoded, event);
    }
}
