//! Event store database schema and statements.
//!
//! Table names are identifiers and cannot be bound as parameters, so they are
//! embedded in the statement text. They come from a `StoreConfig`, which only
//! holds names restricted to `[0-9a-zA-Z_]`, and are always double-quoted.
//! Every value is bound as a parameter.

use strata_core::config::StoreConfig;

/// DDL and DML for one pair of event/snapshot relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Creates the event log relation.
    pub create_event_table: String,
    /// Creates the snapshot relation.
    pub create_snapshot_table: String,
    /// Drops the event log relation.
    pub drop_event_table: String,
    /// Drops the snapshot relation.
    pub drop_snapshot_table: String,
    pub(crate) insert_event: String,
    pub(crate) select_events_by_aggregate: String,
    pub(crate) select_last_event: String,
    pub(crate) select_all_events: String,
    pub(crate) upsert_snapshot: String,
    pub(crate) select_snapshot: String,
}

impl Schema {
    /// Renders every statement for the relations named in `config`.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        let events = config.event_table();
        let snapshots = config.snapshot_table();

        Self {
            create_event_table: format!(
                r#"
CREATE TABLE IF NOT EXISTS "{events}" (
    position      BIGSERIAL NOT NULL,
    id            UUID NOT NULL,
    "aggregateId" UUID NOT NULL,
    revision      BIGINT NOT NULL,
    event         JSONB NOT NULL,

    CONSTRAINT "{events}_pk" PRIMARY KEY (position),
    CONSTRAINT "{events}_id_unique" UNIQUE (id),
    CONSTRAINT "{events}_aggregate_revision_unique" UNIQUE ("aggregateId", revision)
)"#
            ),
            create_snapshot_table: format!(
                r#"
CREATE TABLE IF NOT EXISTS "{snapshots}" (
    "aggregateId" UUID NOT NULL,
    revision      BIGINT NOT NULL,
    data          JSONB NOT NULL,

    CONSTRAINT "{snapshots}_pk" PRIMARY KEY ("aggregateId")
)"#
            ),
            drop_event_table: format!(r#"DROP TABLE IF EXISTS "{events}""#),
            drop_snapshot_table: format!(r#"DROP TABLE IF EXISTS "{snapshots}""#),
            insert_event: format!(
                r#"INSERT INTO "{events}" (id, "aggregateId", revision, event) VALUES ($1, $2, $3, $4)"#
            ),
            select_events_by_aggregate: format!(
                r#"SELECT position, event FROM "{events}"
WHERE "aggregateId" = $1 AND revision >= $2 AND revision <= $3
ORDER BY revision"#
            ),
            select_last_event: format!(
                r#"SELECT position, event FROM "{events}"
WHERE "aggregateId" = $1
ORDER BY revision DESC
LIMIT 1"#
            ),
            select_all_events: format!(
                r#"SELECT position, event FROM "{events}"
WHERE position >= $1 AND position <= $2
ORDER BY position"#
            ),
            upsert_snapshot: format!(
                r#"INSERT INTO "{snapshots}" ("aggregateId", revision, data) VALUES ($1, $2, $3)
ON CONFLICT ("aggregateId") DO UPDATE
SET revision = EXCLUDED.revision, data = EXCLUDED.data
WHERE "{snapshots}".revision < EXCLUDED.revision"#
            ),
            select_snapshot: format!(
                r#"SELECT "aggregateId", revision, data FROM "{snapshots}" WHERE "aggregateId" = $1"#
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let schema = Schema::new(&StoreConfig::default());

        assert!(
            schema
                .create_event_table
                .contains(r#"CREATE TABLE IF NOT EXISTS "event_store""#)
        );
        assert!(
            schema
                .create_snapshot_table
                .contains(r#"CREATE TABLE IF NOT EXISTS "snapshot_store""#)
        );
        assert_eq!(schema.drop_event_table, r#"DROP TABLE IF EXISTS "event_store""#);
    }

    #[test]
    fn test_hostile_table_name_is_neutralized() {
        let config = StoreConfig::builder()
            .event_table(r#"ev"; DROP TABLE users; --"#)
            .build()
            .unwrap();

        let schema = Schema::new(&config);

        assert!(schema.insert_event.starts_with(r#"INSERT INTO "evDROPTABLEusers" "#));
        assert!(!schema.create_event_table.contains(';'));
    }

    #[test]
    fn test_values_are_parameterized() {
        let schema = Schema::new(&StoreConfig::default());

        assert!(schema.insert_event.ends_with("VALUES ($1, $2, $3, $4)"));
        assert!(schema.select_events_by_aggregate.contains(r#""aggregateId" = $1"#));
        assert!(schema.select_all_events.contains("position >= $1 AND position <= $2"));
        assert!(schema.upsert_snapshot.contains("VALUES ($1, $2, $3)"));
    }

    #[test]
    fn test_uniqueness_constraints() {
        let schema = Schema::new(&StoreConfig::default());

        assert!(schema.create_event_table.contains(r#"UNIQUE ("aggregateId", revision)"#));
        assert!(schema.create_event_table.contains("UNIQUE (id)"));
        assert!(
            schema
                .create_snapshot_table
                .contains(r#"PRIMARY KEY ("aggregateId")"#)
        );
    }

    #[test]
    fn test_constraint_names_fit_identifier_limit_at_longest_table_name() {
        let config = StoreConfig::builder()
            .event_table("e".repeat(strata_core::config::MAX_TABLE_NAME_LEN))
            .snapshot_table("s".repeat(strata_core::config::MAX_TABLE_NAME_LEN))
            .build()
            .unwrap();

        let schema = Schema::new(&config);

        let constraint_names: Vec<&str> = schema
            .create_event_table
            .split("CONSTRAINT \"")
            .skip(1)
            .chain(schema.create_snapshot_table.split("CONSTRAINT \"").skip(1))
            .filter_map(|rest| rest.split('"').next())
            .collect();
        assert_eq!(constraint_names.len(), 4);
        assert!(constraint_names.iter().all(|name| name.len() <= 63));
    }

    #[test]
    fn test_snapshot_upsert_only_moves_forward() {
        let schema = Schema::new(&StoreConfig::default());

        assert!(
            schema
                .upsert_snapshot
                .contains(r#"WHERE "snapshot_store".revision < EXCLUDED.revision"#)
        );
    }
}
