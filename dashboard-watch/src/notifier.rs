//! Snapshot publication and loop wake-ups.

use std::sync::Arc;

use tracing::trace;

use dashboard_core::traits::Receiver;
use dashboard_store::RecordStore;

use crate::trigger::Trigger;

/// Publishes snapshots to the receiver and wakes the enrichment loops.
pub struct Notifier {
    store: Arc<RecordStore>,
    receiver: Arc<dyn Receiver>,
    logo: Trigger,
    tls: Trigger,
}

impl Notifier {
    /// Creates a notifier over `store`.
    pub fn new(store: Arc<RecordStore>, receiver: Arc<dyn Receiver>, logo: Trigger, tls: Trigger) -> Self {
        Self {
            store,
            receiver,
            logo,
            tls,
        }
    }

    /// Publishes a snapshot, then wakes both loops without blocking.
    pub fn notify(&self) {
        self.publish();
        let logo = self.logo.fire();
        let tls = self.tls.fire();
        trace!(logo, tls, "Notified enrichment loops");
    }

    /// Publishes a snapshot without waking anything.
    pub fn publish(&self) {
        self.receiver.set(self.store.snapshot());
    }

    /// The store being published.
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }
}
