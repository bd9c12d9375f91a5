//! Background icon discovery.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use dashboard_core::error::{DashboardError, Result};
use dashboard_core::traits::IconSource;

use crate::notifier::Notifier;
use crate::trigger::TriggerReceiver;

/// Fills in missing logos.
///
/// Runs one pass at start and one per wake-up; there is no timer, so a record
/// whose discovery failed is retried only after the next change.
pub struct LogoLoop {
    notifier: Arc<Notifier>,
    icons: Arc<dyn IconSource>,
    wake: TriggerReceiver,
}

impl LogoLoop {
    /// Creates the loop.
    pub fn new(notifier: Arc<Notifier>, icons: Arc<dyn IconSource>, wake: TriggerReceiver) -> Self {
        Self { notifier, icons, wake }
    }

    /// One discovery pass over the live records.
    ///
    /// Returns the number of logos written, or `Cancelled` if `shutdown`
    /// fired mid-pass.
    #[instrument(skip_all)]
    pub async fn pass(&self, shutdown: &CancellationToken) -> Result<usize> {
        let store = self.notifier.store();
        let mut found = 0;

        for record in store.records().into_iter().filter(|r| r.needs_logo()) {
            let Some(first) = record.refs.first() else {
                continue;
            };
            let logo = tokio::select! {
                _ = shutdown.cancelled() => return Err(DashboardError::Cancelled),
                logo = self.icons.discover(&first.url) => logo,
            };
            if let Some(logo) = logo {
                if store.set_logo(&record.uid, &logo) {
                    debug!(id = %record.id, logo = %logo, "Logo discovered");
                    found += 1;
                }
            }
        }

        Ok(found)
    }

    /// Runs passes until `shutdown` fires.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        info!("Logo loop started");
        loop {
            match self.pass(&shutdown).await {
                Ok(found) => debug!(found, "Logo pass complete"),
                Err(DashboardError::Cancelled) => break,
                Err(e) => return Err(e),
            }
            self.notifier.publish();

            tokio::select! {
                _ = shutdown.cancelled() => break,
                woke = self.wake.wait() => if !woke { break },
            }
        }
        info!("Logo loop stopped");
        Ok(())
    }
}
