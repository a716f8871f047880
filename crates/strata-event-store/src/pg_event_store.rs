//! `PostgreSQL` implementation of the `EventRepository` trait.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use strata_core::config::StoreConfig;
use strata_core::error::StoreError;
use strata_core::event::{Event, RecordedEvent};
use strata_core::policy::{SnapshotPolicy, validate_batch};
use strata_core::range::{PositionRange, RevisionRange};
use strata_core::repository::EventRepository;

use crate::config::PostgresConfig;
use crate::error::{map_insert_error, map_sqlx_error};
use crate::schema::Schema;
use crate::snapshot;

/// Attempts made to provision the schema before giving up.
pub const INIT_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubled on every further retry.
pub const INIT_BACKOFF: Duration = Duration::from_millis(100);

/// Whether schema initialization succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The relations exist and the store accepts operations.
    Ready,
    /// Initialization failed; every operation fails with `Unavailable`.
    Degraded,
}

/// PostgreSQL-backed event store.
///
/// Each operation checks out one pooled connection (appends use one
/// transaction) and gives it back when the guard drops, on every exit path.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pub(crate) pool: PgPool,
    config: StoreConfig,
    pub(crate) schema: Schema,
    policy: SnapshotPolicy,
    readiness: Readiness,
}

type EventRow = (i64, Json<Event>);

fn to_recorded((position, Json(event)): EventRow) -> RecordedEvent {
    RecordedEvent { position, event }
}

impl PgEventStore {
    /// Creates a `PgEventStore` over relations that are assumed to exist.
    ///
    /// Use [`initialize`](Self::initialize) to provision them first.
    #[must_use]
    pub fn new(pool: PgPool, config: StoreConfig) -> Self {
        Self {
            schema: Schema::new(&config),
            policy: SnapshotPolicy::from(&config),
            pool,
            config,
            readiness: Readiness::Ready,
        }
    }

    /// Builds a lazily connecting pool from `pg` and initializes the store.
    pub async fn connect(pg: &PostgresConfig, config: StoreConfig) -> Self {
        info!(host = %pg.host, port = pg.port, database = %pg.db_name, "connecting event store");
        Self::initialize(pg.lazy_pool(), config).await
    }

    /// Provisions both relations, retrying up to [`INIT_ATTEMPTS`] times
    /// with exponential backoff.
    ///
    /// A final failure is logged and yields a store whose
    /// [`readiness`](Self::readiness) is `Degraded`; callers must check
    /// [`is_ready`](Self::is_ready) before relying on it.
    #[tracing::instrument(skip(pool, config), fields(
        event_table = config.event_table(),
        snapshot_table = config.snapshot_table(),
    ))]
    pub async fn initialize(pool: PgPool, config: StoreConfig) -> Self {
        let mut store = Self::new(pool, config);
        let mut backoff = INIT_BACKOFF;

        for attempt in 1..=INIT_ATTEMPTS {
            match store.init_schema().await {
                Ok(()) => {
                    info!(attempt, "event store schema ready");
                    return store;
                }
                Err(err) if attempt < INIT_ATTEMPTS => {
                    warn!(attempt, error = %err, ?backoff, "schema initialization failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(err) => {
                    error!(attempts = INIT_ATTEMPTS, error = %err, "unable to initialize event store");
                }
            }
        }

        store.readiness = Readiness::Degraded;
        store
    }

    /// Creates both relations if they do not exist, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the backend cannot be reached and
    /// `StoreError::Infrastructure` if a statement fails.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        sqlx::query(&self.schema.create_event_table)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        sqlx::query(&self.schema.create_snapshot_table)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)
    }

    /// Drops both relations, deleting every event and snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if a statement fails.
    #[tracing::instrument(skip(self))]
    pub async fn teardown(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        sqlx::query(&self.schema.drop_event_table)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        sqlx::query(&self.schema.drop_snapshot_table)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;
        warn!("event store relations dropped");
        Ok(())
    }

    /// Closes the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Returns whether initialization succeeded.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// Returns `true` if the store accepts operations.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    /// Returns the configuration the store was built with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the underlying pool for embedding applications.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(crate) fn ensure_ready(&self) -> Result<(), StoreError> {
        match self.readiness {
            Readiness::Ready => Ok(()),
            Readiness::Degraded => Err(StoreError::Unavailable(
                "event store failed to initialize".into(),
            )),
        }
    }
}

#[async_trait]
impl EventRepository for PgEventStore {
    /// Appends the whole batch in one transaction; the first failing insert
    /// rolls every event and snapshot of the batch back.
    #[tracing::instrument(skip(self, events), fields(events_len = events.len()))]
    async fn append(&self, events: Vec<Event>) -> Result<Vec<Event>, StoreError> {
        self.ensure_ready()?;
        validate_batch(&events)?;

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for event in &events {
            sqlx::query(&self.schema.insert_event)
                .bind(event.id)
                .bind(event.aggregate_id())
                .bind(event.revision())
                .bind(Json(event))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_insert_error(e, event))?;
        }

        for captured in self.policy.snapshots_for(&events) {
            debug!(
                aggregate_id = %captured.aggregate_id,
                revision = captured.revision,
                "capturing snapshot"
            );
            snapshot::upsert(&mut *tx, &self.schema, &captured).await?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(events)
    }

    #[tracing::instrument(skip(self), fields(aggregate_id = %aggregate_id))]
    async fn events_by_aggregate(
        &self,
        aggregate_id: Uuid,
        range: RevisionRange,
    ) -> Result<Vec<RecordedEvent>, StoreError> {
        self.ensure_ready()?;

        let rows: Vec<EventRow> = sqlx::query_as(&self.schema.select_events_by_aggregate)
            .bind(aggregate_id)
            .bind(range.start())
            .bind(range.end())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(to_recorded).collect())
    }

    #[tracing::instrument(skip(self), fields(aggregate_id = %aggregate_id))]
    async fn last_event(&self, aggregate_id: Uuid) -> Result<RecordedEvent, StoreError> {
        self.ensure_ready()?;

        let row: Option<EventRow> = sqlx::query_as(&self.schema.select_last_event)
            .bind(aggregate_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(to_recorded)
            .ok_or(StoreError::AggregateNotFound(aggregate_id))
    }

    #[tracing::instrument(skip(self))]
    async fn all_events(&self, range: PositionRange) -> Result<Vec<RecordedEvent>, StoreError> {
        self.ensure_ready()?;

        let rows: Vec<EventRow> = sqlx::query_as(&self.schema.select_all_events)
            .bind(range.start())
            .bind(range.end())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(to_recorded).collect())
    }
}
