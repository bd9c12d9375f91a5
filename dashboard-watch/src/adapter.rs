//! Translation of resource events into store mutations.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use dashboard_core::constants::{ANNO_DESCRIPTION, ANNO_HIDE, ANNO_LOGO_URL, ANNO_TITLE, ANNO_URL};
use dashboard_core::traits::{ClusterQuery, ResourceEventHandler};
use dashboard_core::types::{IngressPath, IngressResource, Record, Reference, WatchObject};

use crate::notifier::Notifier;

/// Folds watch callbacks into the record store.
///
/// Every callback carrying an ingress ends with a snapshot publication and a
/// wake-up of both enrichment loops. Payloads of any other kind are ignored.
pub struct WatchAdapter {
    notifier: Arc<Notifier>,
    cluster: Arc<dyn ClusterQuery>,
}

impl WatchAdapter {
    /// Creates an adapter writing through `notifier`'s store.
    pub fn new(notifier: Arc<Notifier>, cluster: Arc<dyn ClusterQuery>) -> Self {
        Self { notifier, cluster }
    }

    /// Derives the record for an ingress.
    ///
    /// Endpoint lookups that fail are logged and count as zero.
    #[instrument(skip(self, ingress), fields(id = %ingress.sort_key()))]
    pub async fn derive(&self, ingress: &IngressResource) -> Record {
        let mut record = Record::new(ingress.uid.clone(), ingress.namespace.clone(), ingress.name.clone());
        record.class = ingress.class_name();
        record.title = ingress.annotation(ANNO_TITLE).unwrap_or_default().to_string();
        record.description = ingress.annotation(ANNO_DESCRIPTION).unwrap_or_default().to_string();
        record.logo_url = ingress.annotation(ANNO_LOGO_URL).unwrap_or_default().to_string();
        record.hidden = ingress.annotation(ANNO_HIDE).and_then(parse_bool).unwrap_or(false);
        record.tls = ingress.is_secure();
        record.refs = self.references(ingress).await;
        record
    }

    async fn references(&self, ingress: &IngressResource) -> Vec<Reference> {
        if let Some(url) = ingress.annotation(ANNO_URL) {
            let mut total = 0;
            for path in ingress.paths() {
                total += self.path_endpoints(ingress, path).await;
            }
            return vec![Reference::new(url).with_pods(total)];
        }

        let scheme = if ingress.is_secure() { "https://" } else { "http://" };
        let mut refs = Vec::new();
        for rule in &ingress.rules {
            for path in &rule.paths {
                let url = format!("{}{}{}", scheme, rule.host, path.path);
                let pods = self.path_endpoints(ingress, path).await;
                refs.push(Reference::new(url).with_pods(pods));
            }
        }
        refs
    }

    async fn path_endpoints(&self, ingress: &IngressResource, path: &IngressPath) -> usize {
        let Some(backend) = &path.backend else {
            return 0;
        };
        match self.cluster.endpoint_count(&ingress.namespace, backend).await {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    ingress = %ingress.name,
                    namespace = %ingress.namespace,
                    path = %path.path,
                    error = %e,
                    "Failed to get endpoint count"
                );
                0
            }
        }
    }

    async fn upsert(&self, obj: WatchObject) {
        let Some(ingress) = obj.as_ingress() else {
            debug!(kind = obj.kind(), "Ignoring non-ingress object");
            return;
        };
        let record = self.derive(ingress).await;
        self.notifier.store().upsert(record);
        self.notifier.notify();
    }
}

#[async_trait]
impl ResourceEventHandler for WatchAdapter {
    async fn on_add(&self, obj: WatchObject) {
        self.upsert(obj).await;
    }

    async fn on_update(&self, _old: WatchObject, new: WatchObject) {
        self.upsert(new).await;
    }

    async fn on_delete(&self, obj: WatchObject) {
        let Some(ingress) = obj.as_ingress() else {
            debug!(kind = obj.kind(), "Ignoring non-ingress object");
            return;
        };
        self.notifier.store().delete(&ingress.uid);
        self.notifier.notify();
    }
}

/// Boolean annotation values: `1 t T TRUE true True` and their false forms.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
