//! Idle-connection fault detection.
//!
//! A connection that dies while it sits idle in the pool is treated as fatal to the
//! process: nothing here tries to reconnect. [`FaultMonitor`] sweeps the idle
//! connections on an interval and publishes the first fault it finds; the process owner
//! awaits [`FaultMonitor::wait`] next to its real work and shuts down when it resolves.

use crate::store::PostStore;
use deadpool_postgres::Pool;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Exit status used by processes that terminate on a [`PoolFault`].
pub const POOL_FAULT_EXIT_CODE: i32 = 255;

/// An idle pooled connection was found closed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unexpected error on idle client: {closed_connections} idle connection(s) closed")]
pub struct PoolFault {
    /// Number of idle connections found closed in the sweep that raised the fault.
    pub closed_connections: usize,
    /// When the sweep detected it.
    pub detected_at: SystemTime,
}

/// Configuration for a [`FaultMonitor`].
#[derive(Debug, Clone)]
pub struct FaultMonitorConfig {
    /// Time between sweeps of the idle connections.
    pub sweep_interval: Duration,
}

impl Default for FaultMonitorConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl FaultMonitorConfig {
    /// Create config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sweep interval.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// Background watcher for idle-connection faults on a pool.
///
/// Dropping the monitor stops the sweep task.
#[derive(Debug)]
pub struct FaultMonitor {
    rx: watch::Receiver<Option<PoolFault>>,
    worker: JoinHandle<()>,
}

impl FaultMonitor {
    /// Start sweeping the pool behind `store` with the default interval.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(store: &PostStore) -> Self {
        Self::spawn_with_config(store, FaultMonitorConfig::default())
    }

    /// Start sweeping the pool behind `store` with a custom configuration.
    pub fn spawn_with_config(store: &PostStore, config: FaultMonitorConfig) -> Self {
        let (tx, rx) = watch::channel(None);
        let pool = store.pool().clone();
        let worker = tokio::spawn(run_sweep_loop(pool, config.sweep_interval, tx));
        Self { rx, worker }
    }

    /// The fault, if one has been detected.
    pub fn fault(&self) -> Option<PoolFault> {
        self.rx.borrow().clone()
    }

    /// Wait until an idle-connection fault is detected.
    ///
    /// Never resolves if the pool stays healthy.
    pub async fn wait(&mut self) -> PoolFault {
        let fault = match self.rx.wait_for(Option::is_some).await {
            Ok(fault) => fault.clone(),
            Err(_) => None,
        };
        match fault {
            Some(fault) => fault,
            // Sender gone without a fault: the sweep was stopped.
            None => std::future::pending().await,
        }
    }

    /// Stop the sweep task.
    pub fn stop(self) {
        self.worker.abort();
    }
}

impl Drop for FaultMonitor {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_sweep_loop(
    pool: Pool,
    interval: Duration,
    tx: watch::Sender<Option<PoolFault>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if pool.is_closed() {
            tracing::debug!("pool closed; stopping idle-connection sweep");
            return;
        }

        let closed = sweep_idle(&pool);
        if closed > 0 {
            let fault = PoolFault {
                closed_connections: closed,
                detected_at: SystemTime::now(),
            };
            tracing::error!(closed_connections = closed, "{fault}");
            tx.send_replace(Some(fault));
            return;
        }
    }
}

/// Remove idle connections whose socket has closed; returns how many were found.
///
/// Only connections sitting in the pool are visited, never ones checked out by a caller.
fn sweep_idle(pool: &Pool) -> usize {
    pool.retain(|client, _metrics| !client.is_closed())
        .removed
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DiscreteSettings, StoreConfig};
    use crate::pool::create_pool;

    fn idle_store() -> PostStore {
        let pool = create_pool(&StoreConfig::discrete(DiscreteSettings {
            host: Some("127.0.0.1".to_string()),
            port: Some(1),
            ..Default::default()
        }))
        .unwrap();
        PostStore::new(pool)
    }

    #[test]
    fn fault_message_names_idle_client() {
        let fault = PoolFault {
            closed_connections: 2,
            detected_at: SystemTime::UNIX_EPOCH,
        };
        assert_eq!(
            fault.to_string(),
            "Unexpected error on idle client: 2 idle connection(s) closed"
        );
    }

    #[tokio::test]
    async fn empty_pool_sweep_finds_nothing() {
        let store = idle_store();
        assert_eq!(sweep_idle(store.pool()), 0);
    }

    #[tokio::test]
    async fn healthy_pool_raises_no_fault() {
        let store = idle_store();
        let mut monitor = FaultMonitor::spawn_with_config(
            &store,
            FaultMonitorConfig::new().sweep_interval(Duration::from_millis(10)),
        );

        let waited = tokio::time::timeout(Duration::from_millis(100), monitor.wait()).await;
        assert!(waited.is_err());
        assert_eq!(monitor.fault(), None);
        monitor.stop();
    }

    #[tokio::test]
    async fn closed_pool_stops_the_sweep_without_fault() {
        let store = idle_store();
        let monitor = FaultMonitor::spawn_with_config(
            &store,
            FaultMonitorConfig::new().sweep_interval(Duration::from_millis(10)),
        );
        store.pool().close();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(monitor.worker.is_finished());
        assert_eq!(monitor.fault(), None);
    }
}
