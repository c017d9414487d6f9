//! Connection pool construction

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolBuilder, RecyclingMethod};
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::NoTls;
use tokio_postgres::Socket;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};

/// Build the store's connection pool from configuration.
///
/// Production configs get a `native-tls` connector; discrete configs connect without
/// TLS. No connection is opened until the first checkout. The pool sets no wait or
/// create timeouts: callers beyond `max_size` wait until a connection is returned.
///
/// # Example
///
/// ```ignore
/// let config = blogstore::StoreConfig::from_env()?;
/// let pool = blogstore::create_pool(&config)?;
/// let store = blogstore::PostStore::new(pool);
/// ```
pub fn create_pool(config: &StoreConfig) -> StoreResult<Pool> {
    let pg_config = config.pg_config()?;
    let max_size = config.pool.max_size;

    if config.is_production() {
        let connector = native_tls::TlsConnector::new()?;
        let tls = MakeTlsConnector::new(connector);
        tracing::info!(max_size, tls = true, "creating connection pool");
        build_pool(pg_config, tls, |b| b.max_size(max_size))
    } else {
        tracing::info!(max_size, tls = false, "creating connection pool");
        build_pool(pg_config, NoTls, |b| b.max_size(max_size))
    }
}

fn build_pool<T>(
    pg_config: tokio_postgres::Config,
    tls: T,
    configure_pool: impl FnOnce(PoolBuilder) -> PoolBuilder,
) -> StoreResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let mgr = Manager::from_config(pg_config, tls, default_manager_config());
    configure_pool(Pool::builder(mgr))
        .build()
        .map_err(|e| StoreError::Build(e.to_string()))
}

fn default_manager_config() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DiscreteSettings, PoolSettings};

    #[tokio::test]
    async fn pool_is_sized_from_config_without_connecting() {
        let config = StoreConfig::discrete(DiscreteSettings {
            host: Some("127.0.0.1".to_string()),
            port: Some(1),
            ..Default::default()
        })
        .with_pool(PoolSettings { max_size: 3 });

        let pool = create_pool(&config).unwrap();
        let status = pool.status();
        assert_eq!(status.max_size, 3);
        assert_eq!(status.size, 0);
    }
}
