//! Strata Event Store — PostgreSQL-backed event log and snapshot store.
//!
//! [`pg_event_store::PgEventStore`] provisions its two relations on startup
//! and implements the append, query and snapshot operations of
//! `strata-core` over a `sqlx` connection pool.

pub mod config;
mod error;
pub mod pg_event_store;
pub mod schema;
mod snapshot;
