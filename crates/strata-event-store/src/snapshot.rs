//! `PostgreSQL` implementation of the `SnapshotRepository` trait.

use async_trait::async_trait;
use sqlx::PgExecutor;
use uuid::Uuid;

use strata_core::error::StoreError;
use strata_core::repository::SnapshotRepository;
use strata_core::snapshot::Snapshot;

use crate::error::map_sqlx_error;
use crate::pg_event_store::PgEventStore;
use crate::schema::Schema;

/// Writes `snapshot` unless the stored row is at an equal or newer revision.
pub(crate) async fn upsert<'e>(
    executor: impl PgExecutor<'e>,
    schema: &Schema,
    snapshot: &Snapshot,
) -> Result<(), StoreError> {
    sqlx::query(&schema.upsert_snapshot)
        .bind(snapshot.aggregate_id)
        .bind(snapshot.revision)
        .bind(&snapshot.data)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

#[async_trait]
impl SnapshotRepository for PgEventStore {
    #[tracing::instrument(skip(self, data), fields(aggregate_id = %aggregate_id))]
    async fn save_snapshot(
        &self,
        aggregate_id: Uuid,
        revision: i64,
        data: serde_json::Value,
    ) -> Result<(), StoreError> {
        self.ensure_ready()?;
        let snapshot = Snapshot {
            aggregate_id,
            revision,
            data,
        };
        upsert(&self.pool, &self.schema, &snapshot).await
    }

    #[tracing::instrument(skip(self), fields(aggregate_id = %aggregate_id))]
    async fn snapshot(&self, aggregate_id: Uuid) -> Result<Snapshot, StoreError> {
        self.ensure_ready()?;

        let row: Option<(Uuid, i64, serde_json::Value)> =
            sqlx::query_as(&self.schema.select_snapshot)
                .bind(aggregate_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        row.map(|(aggregate_id, revision, data)| Snapshot {
            aggregate_id,
            revision,
            data,
        })
        .ok_or(StoreError::SnapshotNotFound(aggregate_id))
    }
}
