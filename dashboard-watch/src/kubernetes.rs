//! Kubernetes event source and service lookups.
//!
//! Watches `networking.k8s.io/v1` ingresses in all namespaces and resolves
//! backend services with `get` calls.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use dashboard_core::error::{DashboardError, Result};
use dashboard_core::traits::{ClusterQuery, ResourceEventHandler};
use dashboard_core::types::{
    IngressPath, IngressResource, IngressRule, IngressTls, ServiceBackend, ServiceSummary, WatchEvent,
};

use crate::source::EventSource;

/// Connects using the in-cluster service account or the local kubeconfig.
pub async fn connect() -> Result<Client> {
    Client::try_default()
        .await
        .map_err(|e| DashboardError::ConfigError(format!("Kubernetes client: {}", e)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT SOURCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Ingress watch over the cluster API.
///
/// Initial listings and relists are diffed against the ingresses seen so far,
/// so objects removed while the watch was down are reported as deleted.
pub struct KubeEventSource {
    client: Client,
}

impl KubeEventSource {
    /// Creates a source over `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventSource for KubeEventSource {
    fn name(&self) -> &str {
        "kubernetes"
    }

    async fn run(self: Box<Self>, handler: Arc<dyn ResourceEventHandler>, shutdown: CancellationToken) -> Result<()> {
        let api: Api<Ingress> = Api::all(self.client.clone());
        let mut stream = watcher(api, watcher::Config::default()).default_backoff().boxed();
        let mut tracker = Tracker::default();

        info!("Watching ingresses");
        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                next = stream.try_next() => next,
            };
            match next {
                Ok(Some(event)) => {
                    for event in tracker.translate(event) {
                        handler.handle(event).await;
                    }
                }
                Ok(None) => return Err(DashboardError::EventSourceError("ingress watch ended".into())),
                Err(e) => warn!(error = %e, "Ingress watch error"),
            }
        }
    }
}

/// Remembers the last state of every ingress to build update and delete events.
#[derive(Default)]
struct Tracker {
    known: HashMap<String, IngressResource>,
    relisting: Option<HashSet<String>>,
}

impl Tracker {
    fn translate(&mut self, event: watcher::Event<Ingress>) -> Vec<WatchEvent> {
        match event {
            watcher::Event::Apply(ingress) => self.apply(to_resource(&ingress)).into_iter().collect(),
            watcher::Event::InitApply(ingress) => {
                let resource = to_resource(&ingress);
                if let Some(seen) = self.relisting.as_mut() {
                    seen.insert(resource.uid.clone());
                }
                self.apply(resource).into_iter().collect()
            }
            watcher::Event::Delete(ingress) => {
                let resource = to_resource(&ingress);
                self.known.remove(&resource.uid);
                vec![WatchEvent::Deleted(resource.into())]
            }
            watcher::Event::Init => {
                self.relisting = Some(HashSet::new());
                Vec::new()
            }
            watcher::Event::InitDone => {
                let seen = self.relisting.take().unwrap_or_default();
                let gone: Vec<String> = self.known.keys().filter(|uid| !seen.contains(*uid)).cloned().collect();
                gone.into_iter()
                    .filter_map(|uid| self.known.remove(&uid))
                    .map(|resource| WatchEvent::Deleted(resource.into()))
                    .collect()
            }
        }
    }

    fn apply(&mut self, resource: IngressResource) -> Option<WatchEvent> {
        if resource.uid.is_empty() {
            debug!(name = %resource.name, "Skipping ingress without uid");
            return None;
        }
        let event = match self.known.insert(resource.uid.clone(), resource.clone()) {
            Some(old) => WatchEvent::Updated {
                old: old.into(),
                new: resource.into(),
            },
            None => WatchEvent::Added(resource.into()),
        };
        Some(event)
    }
}

/// Converts the API object into the shape the adapter reads.
pub fn to_resource(ingress: &Ingress) -> IngressResource {
    let meta = &ingress.metadata;
    let spec = ingress.spec.clone().unwrap_or_default();

    IngressResource {
        uid: meta.uid.clone().unwrap_or_default(),
        name: meta.name.clone().unwrap_or_default(),
        namespace: meta.namespace.clone().unwrap_or_default(),
        annotations: meta.annotations.clone().unwrap_or_default(),
        ingress_class_name: spec.ingress_class_name,
        tls: spec
            .tls
            .unwrap_or_default()
            .into_iter()
            .map(|tls| IngressTls {
                hosts: tls.hosts.unwrap_or_default(),
                secret_name: tls.secret_name,
            })
            .collect(),
        rules: spec
            .rules
            .unwrap_or_default()
            .into_iter()
            .map(|rule| IngressRule {
                host: rule.host.unwrap_or_default(),
                paths: rule
                    .http
                    .map(|http| http.paths)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|path| IngressPath {
                        path: path.path.unwrap_or_default(),
                        backend: path.backend.service.map(|svc| ServiceBackend { name: svc.name }),
                    })
                    .collect(),
            })
            .collect(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLUSTER QUERY
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolves endpoint counts from service specs.
pub struct KubeClusterQuery {
    client: Client,
}

impl KubeClusterQuery {
    /// Creates a query over `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterQuery for KubeClusterQuery {
    #[instrument(skip(self, backend), fields(service = %backend.name))]
    async fn endpoint_count(&self, namespace: &str, backend: &ServiceBackend) -> Result<usize> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        let service = api.get(&backend.name).await.map_err(|e| match e {
            kube::Error::Api(ref response) if response.code == 404 => DashboardError::ServiceNotFound {
                namespace: namespace.to_string(),
                name: backend.name.clone(),
            },
            other => DashboardError::ClusterQueryFailed {
                namespace: namespace.to_string(),
                name: backend.name.clone(),
                reason: other.to_string(),
            },
        })?;

        Ok(summarize(&service).endpoint_count())
    }
}

/// Addressing fields of a service.
pub fn summarize(service: &Service) -> ServiceSummary {
    let spec = service.spec.clone().unwrap_or_default();
    ServiceSummary {
        cluster_ips: spec.cluster_ips.unwrap_or_default(),
        external_ips: spec.external_ips.unwrap_or_default(),
        external_name: spec.external_name,
    }
}
