//! Store configuration.
//!
//! Table names and the snapshot cadence are fixed when the configuration is
//! built. Table names end up embedded in SQL as identifiers, so every
//! caller-supplied name goes through [`sanitize_identifier`] first.

use std::num::NonZeroU32;

use crate::error::StoreError;

/// Default name of the event log relation.
pub const DEFAULT_EVENT_TABLE: &str = "event_store";

/// Default name of the snapshot relation.
pub const DEFAULT_SNAPSHOT_TABLE: &str = "snapshot_store";

/// Default snapshot cadence, in revisions.
pub const DEFAULT_SNAPSHOT_INTERVAL: u32 = 50;

/// Longest identifier PostgreSQL keeps without truncation.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Longest suffix appended to a table name to form a constraint name
/// (`_aggregate_revision_unique`).
const LONGEST_CONSTRAINT_SUFFIX: usize = 26;

/// Longest accepted table name. Constraint names derived from it must stay
/// within [`MAX_IDENTIFIER_LEN`] or PostgreSQL truncates them into clashes.
pub const MAX_TABLE_NAME_LEN: usize = MAX_IDENTIFIER_LEN - LONGEST_CONSTRAINT_SUFFIX;

/// Strips every character outside `[0-9a-zA-Z_]`.
#[must_use]
pub fn sanitize_identifier(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Immutable store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    event_table: String,
    snapshot_table: String,
    snapshot_interval: NonZeroU32,
}

impl StoreConfig {
    /// Starts a builder seeded with the defaults.
    #[must_use]
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Sanitized name of the event log relation.
    #[must_use]
    pub fn event_table(&self) -> &str {
        &self.event_table
    }

    /// Sanitized name of the snapshot relation.
    #[must_use]
    pub fn snapshot_table(&self) -> &str {
        &self.snapshot_table
    }

    /// Revision cadence at which snapshots are captured.
    #[must_use]
    pub fn snapshot_interval(&self) -> NonZeroU32 {
        self.snapshot_interval
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            event_table: DEFAULT_EVENT_TABLE.to_owned(),
            snapshot_table: DEFAULT_SNAPSHOT_TABLE.to_owned(),
            snapshot_interval: NonZeroU32::new(DEFAULT_SNAPSHOT_INTERVAL)
                .unwrap_or(NonZeroU32::MIN),
        }
    }
}

/// Builder for [`StoreConfig`].
#[derive(Debug, Default, Clone)]
pub struct StoreConfigBuilder {
    event_table: Option<String>,
    snapshot_table: Option<String>,
    snapshot_interval: Option<u32>,
}

impl StoreConfigBuilder {
    /// Overrides the event log relation name.
    #[must_use]
    pub fn event_table(mut self, name: impl Into<String>) -> Self {
        self.event_table = Some(name.into());
        self
    }

    /// Overrides the snapshot relation name.
    #[must_use]
    pub fn snapshot_table(mut self, name: impl Into<String>) -> Self {
        self.snapshot_table = Some(name.into());
        self
    }

    /// Overrides the snapshot cadence.
    #[must_use]
    pub fn snapshot_interval(mut self, interval: u32) -> Self {
        self.snapshot_interval = Some(interval);
        self
    }

    /// Validates and freezes the configuration.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidArgument` if a table name is empty after
    /// sanitizing or too long, if both relations would share a name, or if
    /// the snapshot interval is zero.
    pub fn build(self) -> Result<StoreConfig, StoreError> {
        let event_table = table_name(self.event_table, DEFAULT_EVENT_TABLE)?;
        let snapshot_table = table_name(self.snapshot_table, DEFAULT_SNAPSHOT_TABLE)?;
        if event_table == snapshot_table {
            return Err(StoreError::InvalidArgument(format!(
                "event and snapshot tables must differ, both are \"{event_table}\""
            )));
        }

        let snapshot_interval = NonZeroU32::new(
            self.snapshot_interval.unwrap_or(DEFAULT_SNAPSHOT_INTERVAL),
        )
        .ok_or_else(|| {
            StoreError::InvalidArgument("snapshot interval must be greater than 0".into())
        })?;

        Ok(StoreConfig {
            event_table,
            snapshot_table,
            snapshot_interval,
        })
    }
}

fn table_name(supplied: Option<String>, default: &str) -> Result<String, StoreError> {
    let Some(raw) = supplied else {
        return Ok(default.to_owned());
    };
    let name = sanitize_identifier(&raw);
    if name.is_empty() {
        return Err(StoreError::InvalidArgument(format!(
            "table name {raw:?} has no characters in [0-9a-zA-Z_]"
        )));
    }
    if name.len() > MAX_TABLE_NAME_LEN {
        return Err(StoreError::InvalidArgument(format!(
            "table name {name:?} exceeds {MAX_TABLE_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_sanitize_strips_everything_outside_identifier_charset() {
        assert_eq!(sanitize_identifier("events\"; DROP TABLE x; --"), "eventsDROPTABLEx");
        assert_eq!(sanitize_identifier("tenant-42.events"), "tenant42events");
        assert_eq!(sanitize_identifier("already_ok_9"), "already_ok_9");
        assert_eq!(sanitize_identifier("événements"), "vnements");
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::builder().build().unwrap();

        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.event_table(), "event_store");
        assert_eq!(config.snapshot_table(), "snapshot_store");
        assert_eq!(config.snapshot_interval().get(), 50);
    }

    #[test]
    fn test_supplied_names_are_sanitized() {
        let config = StoreConfig::builder()
            .event_table("billing.events")
            .snapshot_table("billing snapshots")
            .snapshot_interval(3)
            .build()
            .unwrap();

        assert_eq!(config.event_table(), "billingevents");
        assert_eq!(config.snapshot_table(), "billingsnapshots");
        assert_eq!(config.snapshot_interval().get(), 3);
    }

    #[test]
    fn test_name_empty_after_sanitizing_is_rejected() {
        let err = StoreConfig::builder().event_table("--;").build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_overlong_name_is_rejected() {
        assert_eq!(MAX_TABLE_NAME_LEN, 37);
        for len in [MAX_TABLE_NAME_LEN + 1, 62, 63, 64] {
            let err = StoreConfig::builder()
                .event_table("e".repeat(len))
                .build()
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_name_at_length_limit_is_accepted() {
        let config = StoreConfig::builder()
            .event_table("e".repeat(MAX_TABLE_NAME_LEN))
            .snapshot_table("s".repeat(MAX_TABLE_NAME_LEN))
            .build()
            .unwrap();

        assert_eq!(config.event_table().len(), MAX_TABLE_NAME_LEN);
        assert_eq!(
            config.event_table().len() + "_aggregate_revision_unique".len(),
            63
        );
    }

    #[test]
    fn test_shared_table_name_is_rejected() {
        let err = StoreConfig::builder()
            .event_table("store")
            .snapshot_table("st-ore")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let err = StoreConfig::builder()
            .snapshot_interval(0)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
