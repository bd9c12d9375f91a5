//! Background certificate expiry scan.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use dashboard_core::constants::TLS_SCAN_INTERVAL;
use dashboard_core::error::{DashboardError, Result};
use dashboard_core::traits::CertificateSource;

use crate::notifier::Notifier;
use crate::trigger::TriggerReceiver;

/// Keeps `tls_expiration` of TLS records current.
///
/// Runs one pass at start, then one per wake-up or per `period`, whichever
/// comes first.
pub struct TlsLoop {
    notifier: Arc<Notifier>,
    certificates: Arc<dyn CertificateSource>,
    wake: TriggerReceiver,
    period: Duration,
}

impl TlsLoop {
    /// Creates the loop with the default hourly period.
    pub fn new(notifier: Arc<Notifier>, certificates: Arc<dyn CertificateSource>, wake: TriggerReceiver) -> Self {
        Self {
            notifier,
            certificates,
            wake,
            period: TLS_SCAN_INTERVAL,
        }
    }

    /// Sets the periodic scan interval.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// One scan over the live TLS records.
    ///
    /// Each host is dialed at most once per pass, whatever the outcome.
    /// Failures are logged once. A record whose hosts all fail keeps its
    /// previous expiry. Returns the number of records updated.
    #[instrument(skip_all)]
    pub async fn pass(&self, shutdown: &CancellationToken) -> Result<usize> {
        let store = self.notifier.store();
        let mut visited: HashMap<String, Option<DateTime<Utc>>> = HashMap::new();
        let mut updated = 0;

        for record in store.records().into_iter().filter(|r| r.tls) {
            let mut earliest: Option<DateTime<Utc>> = None;

            for reference in &record.refs {
                let Some(host) = reference.host() else {
                    continue;
                };

                if let Some(known) = visited.get(&host) {
                    earliest = sooner(earliest, *known);
                    continue;
                }

                let result = tokio::select! {
                    _ = shutdown.cancelled() => return Err(DashboardError::Cancelled),
                    result = self.certificates.expiration(&host) => result,
                };

                let expiry = match result {
                    Ok(Some(at)) => Some(at),
                    Ok(None) => {
                        debug!(host = %host, "No certificate presented");
                        None
                    }
                    Err(e) => {
                        warn!(host = %host, error = %e, "Failed to get expiration time");
                        None
                    }
                };
                visited.insert(host, expiry);
                earliest = sooner(earliest, expiry);
            }

            if let Some(at) = earliest {
                if store.set_tls_expiration(&record.uid, at) {
                    updated += 1;
                }
            }
        }

        Ok(updated)
    }

    /// Runs passes until `shutdown` fires.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        info!(period = ?self.period, "TLS loop started");
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            match self.pass(&shutdown).await {
                Ok(updated) => debug!(updated, "TLS pass complete"),
                Err(DashboardError::Cancelled) => break,
                Err(e) => return Err(e),
            }
            self.notifier.publish();

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
                woke = self.wake.wait() => if !woke { break },
            }
        }
        info!("TLS loop stopped");
        Ok(())
    }
}

fn sooner(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
