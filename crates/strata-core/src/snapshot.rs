//! Snapshot data model.

use uuid::Uuid;

/// The materialized state of an aggregate as of a specific revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Aggregate the snapshot belongs to. At most one snapshot per aggregate.
    pub aggregate_id: Uuid,
    /// Revision of the event whose data was captured.
    pub revision: i64,
    /// Captured payload.
    pub data: serde_json::Value,
}
