//! Store configuration.
//!
//! A store connects in one of two modes:
//! - **production**: a single connection string, TLS required;
//! - **discrete**: individual user/host/database/password/port settings, no TLS.
//!
//! [`StoreConfig::from_env`] reads the same variable names the blog service has always
//! used (`NODE_ENV`, `DATABASE_URL`, `DB_USER`, `DB_HOST`, `DB_DB`, `DB_PSWD`, `DB_PORT`).

use crate::error::{StoreError, StoreResult};
use serde::Deserialize;
use tokio_postgres::config::SslMode;

/// Default upper bound on pooled connections.
pub const DEFAULT_POOL_MAX_SIZE: usize = 10;

/// Environment variables that select production mode (first one set wins).
pub const MODE_VARS: [&str; 2] = ["BLOG_ENV", "NODE_ENV"];

/// How the store reaches the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSettings {
    /// Connection string with TLS forced on.
    Production { connection_string: String },
    /// Individual settings, plain TCP.
    Discrete(DiscreteSettings),
}

/// Individual connection settings. Unset fields fall back to the driver defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DiscreteSettings {
    pub user: Option<String>,
    pub host: Option<String>,
    pub database: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
}

/// Pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PoolSettings {
    /// Maximum number of connections, and so of in-flight statements.
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

fn default_max_size() -> usize {
    DEFAULT_POOL_MAX_SIZE
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_POOL_MAX_SIZE,
        }
    }
}

/// Everything needed to build the store's connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub connection: ConnectionSettings,
    pub pool: PoolSettings,
}

impl StoreConfig {
    /// Production mode: connect with `connection_string`, TLS required.
    pub fn production(connection_string: impl Into<String>) -> Self {
        Self {
            connection: ConnectionSettings::Production {
                connection_string: connection_string.into(),
            },
            pool: PoolSettings::default(),
        }
    }

    /// Discrete mode: connect with individual settings, no TLS.
    pub fn discrete(settings: DiscreteSettings) -> Self {
        Self {
            connection: ConnectionSettings::Discrete(settings),
            pool: PoolSettings::default(),
        }
    }

    /// Override pool sizing.
    pub fn with_pool(mut self, pool: PoolSettings) -> Self {
        self.pool = pool;
        self
    }

    /// Whether TLS is used.
    pub fn is_production(&self) -> bool {
        matches!(self.connection, ConnectionSettings::Production { .. })
    }

    /// Read the configuration from process environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let production = MODE_VARS
            .iter()
            .find_map(|key| get(*key))
            .is_some_and(|mode| mode.trim().eq_ignore_ascii_case("production"));

        let config = if production {
            let Some(url) = get("DATABASE_URL") else {
                return Err(StoreError::config(
                    "DATABASE_URL is required in production mode",
                ));
            };
            Self::production(url)
        } else {
            Self::discrete(DiscreteSettings {
                user: get("DB_USER"),
                host: get("DB_HOST"),
                database: get("DB_DB"),
                password: get("DB_PSWD"),
                port: get("DB_PORT")
                    .map(|v| parse_number::<u16>("DB_PORT", &v))
                    .transpose()?,
            })
        };

        let max_size = match get("DB_POOL_MAX_SIZE") {
            Some(v) => parse_number::<usize>("DB_POOL_MAX_SIZE", &v)?,
            None => DEFAULT_POOL_MAX_SIZE,
        };
        if max_size == 0 {
            return Err(StoreError::config("DB_POOL_MAX_SIZE must be at least 1"));
        }

        Ok(config.with_pool(PoolSettings { max_size }))
    }

    /// Translate into a driver configuration.
    pub fn pg_config(&self) -> StoreResult<tokio_postgres::Config> {
        match &self.connection {
            ConnectionSettings::Production { connection_string } => {
                let mut config: tokio_postgres::Config = connection_string
                    .parse()
                    .map_err(|e: tokio_postgres::Error| {
                        StoreError::config(format!("invalid connection string: {e}"))
                    })?;
                config.ssl_mode(SslMode::Require);
                Ok(config)
            }
            ConnectionSettings::Discrete(settings) => {
                let mut config = tokio_postgres::Config::new();
                config.host(settings.host.as_deref().unwrap_or("localhost"));
                if let Some(user) = &settings.user {
                    config.user(user);
                }
                if let Some(database) = &settings.database {
                    config.dbname(database);
                }
                if let Some(password) = &settings.password {
                    config.password(password);
                }
                if let Some(port) = settings.port {
                    config.port(port);
                }
                config.ssl_mode(SslMode::Disable);
                Ok(config)
            }
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> StoreResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| StoreError::config(format!("{key} must be a number, got {value:?}")))
}
