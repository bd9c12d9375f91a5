//! App state: the latest snapshot and server config.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use dashboard_core::traits::Receiver;
use dashboard_core::types::Record;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Listen address
    pub addr: SocketAddr,
    /// Answer CORS preflights from any origin
    pub allow_any_origin: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            allow_any_origin: false,
        }
    }
}

impl ApiConfig {
    /// Sets the listen address.
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Enables permissive CORS.
    pub fn with_any_origin(mut self, enabled: bool) -> Self {
        self.allow_any_origin = enabled;
        self
    }
}

/// Holds the latest snapshot published by the engine.
///
/// Publishing swaps a shared pointer, so readers never block the engine for
/// longer than the swap.
#[derive(Default)]
pub struct DashboardState {
    records: RwLock<Arc<Vec<Record>>>,
    updated_at: RwLock<Option<DateTime<Utc>>>,
    updates: AtomicU64,
}

impl DashboardState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest snapshot.
    pub fn records(&self) -> Arc<Vec<Record>> {
        self.records.read().clone()
    }

    /// When the latest snapshot was published.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        *self.updated_at.read()
    }

    /// Number of snapshots published so far.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }
}

impl Receiver for DashboardState {
    fn set(&self, records: Vec<Record>) {
        debug!(count = records.len(), "Snapshot published");
        *self.records.write() = Arc::new(records);
        *self.updated_at.write() = Some(Utc::now());
        self.updates.fetch_add(1, Ordering::Relaxed);
    }
}

/// Shared handler state.
pub struct AppState {
    /// Server configuration
    pub config: ApiConfig,
    /// Published snapshot
    pub dashboard: Arc<DashboardState>,
    /// Process start, for uptime
    pub started: Instant,
}

impl AppState {
    /// Creates the handler state.
    pub fn new(config: ApiConfig, dashboard: Arc<DashboardState>) -> Self {
        Self {
            config,
            dashboard,
            started: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_snapshot() {
        let state = DashboardState::new();
        assert!(state.records().is_empty());
        assert!(state.updated_at().is_none());

        let held = state.records();
        state.set(vec![Record::new("u1", "default", "app")]);
        state.set(vec![Record::new("u1", "default", "app")]);

        assert!(held.is_empty(), "earlier readers keep their snapshot");
        assert_eq!(state.records().len(), 1);
        assert_eq!(state.updates(), 2);
        assert!(state.updated_at().is_some());
    }

    #[test]
    fn test_config_builder() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let config = ApiConfig::default().with_addr(addr).with_any_origin(true);
        assert_eq!(config.addr, addr);
        assert!(config.allow_any_origin);
    }
}
