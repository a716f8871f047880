//! Strata Core — event store data model and policy.
//!
//! This crate defines the event and snapshot types, the error taxonomy, the
//! store configuration and the rules every backend applies when appending and
//! reading. It contains no infrastructure code.

pub mod config;
pub mod error;
pub mod event;
pub mod policy;
pub mod range;
pub mod repository;
pub mod snapshot;
