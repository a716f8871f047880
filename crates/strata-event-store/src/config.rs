//! Connection and store configuration read from the environment.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use strata_core::config::StoreConfig;
use strata_core::error::StoreError;
use thiserror::Error;

/// Default pool size.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default time to wait for a pooled connection.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    /// An environment variable holds a value that cannot be used.
    #[error("{name} is invalid: {reason}")]
    Invalid {
        /// The offending variable.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The store configuration was rejected.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// PostgreSQL connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    /// Server host name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database name.
    pub db_name: String,
    /// Login role.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Require TLS when `true`; plain connections otherwise.
    pub ssl: bool,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// How long an operation waits for a pooled connection.
    pub acquire_timeout: Duration,
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db_name", &self.db_name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("ssl", &self.ssl)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

impl PostgresConfig {
    /// Reads `POSTGRES_HOST`, `POSTGRES_PORT`, `POSTGRES_DB`, `POSTGRES_USER`,
    /// `POSTGRES_PASSWORD`, and optionally `POSTGRES_SSL` and
    /// `POSTGRES_MAX_CONNECTIONS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads from `vars`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or malformed.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let port = required("POSTGRES_PORT")?
            .parse()
            .map_err(|e| ConfigError::Invalid {
                name: "POSTGRES_PORT",
                reason: format!("must be a valid u16: {e}"),
            })?;
        let ssl = match lookup("POSTGRES_SSL").as_deref() {
            None | Some("" | "false" | "0") => false,
            Some("true" | "1") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "POSTGRES_SSL",
                    reason: format!("expected true or false, got {other:?}"),
                });
            }
        };
        let max_connections = match lookup("POSTGRES_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
                name: "POSTGRES_MAX_CONNECTIONS",
                reason: format!("must be a valid u32: {e}"),
            })?,
        };

        Ok(Self {
            host: required("POSTGRES_HOST")?,
            port,
            db_name: required("POSTGRES_DB")?,
            user: required("POSTGRES_USER")?,
            password: required("POSTGRES_PASSWORD")?,
            ssl,
            max_connections,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        })
    }

    /// Connection options for a single backend session.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.db_name)
            .username(&self.user)
            .password(&self.password)
            .ssl_mode(if self.ssl {
                PgSslMode::Require
            } else {
                PgSslMode::Disable
            })
    }

    /// Builds a pool that connects on first use.
    ///
    /// Connectivity problems therefore surface from the first operation,
    /// which for [`PgEventStore::connect`](crate::pg_event_store::PgEventStore::connect)
    /// is the retried schema initialization.
    #[must_use]
    pub fn lazy_pool(&self) -> PgPool {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect_lazy_with(self.connect_options())
    }
}

/// Reads `EVENT_STORE_TABLE`, `SNAPSHOT_STORE_TABLE` and `SNAPSHOT_INTERVAL`,
/// falling back to the defaults for any that are unset.
///
/// # Errors
///
/// Returns `ConfigError` if the interval is malformed or the resulting
/// configuration is rejected.
pub fn store_config_from_env() -> Result<StoreConfig, ConfigError> {
    store_config_from_lookup(|name| std::env::var(name).ok())
}

fn store_config_from_lookup(
    lookup: impl Fn(&'static str) -> Option<String>,
) -> Result<StoreConfig, ConfigError> {
    let mut builder = StoreConfig::builder();
    if let Some(name) = lookup("EVENT_STORE_TABLE") {
        builder = builder.event_table(name);
    }
    if let Some(name) = lookup("SNAPSHOT_STORE_TABLE") {
        builder = builder.snapshot_table(name);
    }
    if let Some(raw) = lookup("SNAPSHOT_INTERVAL") {
        let interval = raw.parse().map_err(|e| ConfigError::Invalid {
            name: "SNAPSHOT_INTERVAL",
            reason: format!("must be a valid u32: {e}"),
        })?;
        builder = builder.snapshot_interval(interval);
    }
    Ok(builder.build()?)
}
