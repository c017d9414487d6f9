//! Error types for blogstore

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error types for store operations.
///
/// A row that is simply absent is not an error: reads return `Ok(None)` for that case.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failure reported by the database driver (connectivity, constraint violation,
    /// type mismatch, statement timeout).
    #[error("Storage error")]
    Storage(#[from] tokio_postgres::Error),

    /// Could not check a connection out of the pool
    #[error("Pool error")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A column value did not convert to the expected Rust type
    #[error("Decode error on column '{column}'")]
    Decode {
        column: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A statement that always yields a row yielded none
    #[error("Statement '{0}' returned no row")]
    NoRow(&'static str),

    /// Invalid store configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The connection pool could not be built
    #[error("Pool build error: {0}")]
    Build(String),

    /// TLS connector could not be created
    #[error("TLS error")]
    Tls(#[from] native_tls::Error),
}

impl StoreError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, source: tokio_postgres::Error) -> Self {
        Self::Decode {
            column: column.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the failure came from the storage layer (driver, pool checkout or a
    /// column type mismatch).
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Pool(_) | Self::Decode { .. } | Self::NoRow(_)
        )
    }

    /// SQLSTATE code reported by the server, if the failure carries one.
    pub fn sql_state(&self) -> Option<&str> {
        let err = match self {
            Self::Storage(err) => err,
            Self::Pool(deadpool_postgres::PoolError::Backend(err)) => err,
            _ => return None,
        };
        err.as_db_error().map(|db| db.code().code())
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        self.sql_state() == Some("23505")
    }

    /// Check if this is a not-null violation error
    pub fn is_not_null_violation(&self) -> bool {
        self.sql_state() == Some("23502")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn driver_error() -> tokio_postgres::Error {
        "not a url=".parse::<tokio_postgres::Config>().unwrap_err()
    }

    #[test]
    fn decode_error_names_column_and_keeps_cause() {
        let cause = driver_error().to_string();
        let err = StoreError::decode("tags", driver_error());
        assert_eq!(err.to_string(), "Decode error on column 'tags'");
        assert!(err.is_storage());
        assert_eq!(err.sql_state(), None);
        assert_eq!(err.source().map(|s| s.to_string()), Some(cause));
    }

    #[test]
    fn storage_message_is_not_repeated_by_source() {
        let cause = driver_error().to_string();
        let err = StoreError::from(driver_error());
        assert_eq!(err.to_string(), "Storage error");
        assert_eq!(err.source().map(|s| s.to_string()), Some(cause));
    }

    #[test]
    fn pool_closed_is_storage_error() {
        let err = StoreError::from(deadpool_postgres::PoolError::Closed);
        assert!(err.is_storage());
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn config_error_has_no_source() {
        let config = StoreError::config("DATABASE_URL is required in production");
        assert!(config.source().is_none());
        assert_eq!(
            config.to_string(),
            "Configuration error: DATABASE_URL is required in production"
        );
    }
}
