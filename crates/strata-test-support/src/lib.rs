//! Shared test stores and helpers for Strata.

mod event;
mod repository;

pub use event::make_event;
pub use repository::{FailingEventStore, InMemoryEventStore};
