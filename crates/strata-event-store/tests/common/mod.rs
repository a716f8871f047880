//! Shared helpers for `PgEventStore` integration tests.
#![allow(dead_code)]

use sqlx::PgPool;
use strata_core::config::StoreConfig;
use strata_event_store::pg_event_store::PgEventStore;
use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Initialize a store with the default tables and the given cadence.
pub async fn store_with_interval(pool: PgPool, interval: u32) -> PgEventStore {
    init_tracing();
    let config = StoreConfig::builder()
        .snapshot_interval(interval)
        .build()
        .unwrap();
    let store = PgEventStore::initialize(pool, config).await;
    assert!(store.is_ready());
    store
}
