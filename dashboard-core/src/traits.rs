//! Common traits for the dashboard.
//!
//! These traits define the collaborators of the enrichment engine, so that
//! production implementations (Kubernetes, HTTP UI) and test doubles are
//! interchangeable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{Record, ServiceBackend, WatchEvent, WatchObject};

// ═══════════════════════════════════════════════════════════════════════════════
// RECEIVER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Downstream consumer of snapshots.
///
/// Called after every store mutation and after every background pass, so it
/// must accept repeated, possibly identical snapshots.
pub trait Receiver: Send + Sync {
    /// Replaces the published snapshot.
    fn set(&self, records: Vec<Record>);
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLUSTER QUERY TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolves how many endpoints sit behind an ingress backend.
#[async_trait]
pub trait ClusterQuery: Send + Sync {
    /// Returns the reachable endpoint count of `backend` in `namespace`.
    async fn endpoint_count(&self, namespace: &str, backend: &ServiceBackend) -> Result<usize>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENRICHMENT SOURCES
// ═══════════════════════════════════════════════════════════════════════════════

/// Discovers an icon for a page.
#[async_trait]
pub trait IconSource: Send + Sync {
    /// Icon URL for `page_url`, or `None` when nothing qualifies.
    ///
    /// Failures are logged by the implementation, never returned.
    async fn discover(&self, page_url: &str) -> Option<String>;
}

/// Reports when the certificate presented by a host expires.
#[async_trait]
pub trait CertificateSource: Send + Sync {
    /// Earliest expiry in the chain presented by `host`; `None` if no
    /// certificate was presented.
    async fn expiration(&self, host: &str) -> Result<Option<DateTime<Utc>>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT HANDLER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Consumer of watch callbacks.
#[async_trait]
pub trait ResourceEventHandler: Send + Sync {
    /// Object appeared.
    async fn on_add(&self, obj: WatchObject);

    /// Object changed.
    async fn on_update(&self, old: WatchObject, new: WatchObject);

    /// Object disappeared.
    async fn on_delete(&self, obj: WatchObject);

    /// Dispatches an event to the matching callback.
    async fn handle(&self, event: WatchEvent) {
        match event {
            WatchEvent::Added(obj) => self.on_add(obj).await,
            WatchEvent::Updated { old, new } => self.on_update(old, new).await,
            WatchEvent::Deleted(obj) => self.on_delete(obj).await,
        }
    }
}
