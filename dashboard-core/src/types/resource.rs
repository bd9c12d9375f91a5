//! Observed resource shapes and watch events.
//!
//! These mirror the subset of a `networking.k8s.io/v1` Ingress the dashboard
//! reads. Event sources translate their native objects into [`WatchObject`];
//! anything that is not an ingress arrives as [`WatchObject::Other`] and is
//! ignored by the adapter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::ANNO_INGRESS_CLASS;
use crate::types::record::sort_key;

/// Observed ingress resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressResource {
    /// Unique identity assigned by the cluster
    pub uid: String,
    /// Resource name
    pub name: String,
    /// Resource namespace
    pub namespace: String,
    /// Metadata annotations
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// `spec.ingressClassName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_class_name: Option<String>,
    /// `spec.tls`
    #[serde(default)]
    pub tls: Vec<IngressTls>,
    /// `spec.rules`
    #[serde(default)]
    pub rules: Vec<IngressRule>,
}

/// TLS section of an ingress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressTls {
    /// Hosts covered by the secret
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Secret holding the key pair
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
}

/// Host rule of an ingress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    /// Host name, may be empty
    #[serde(default)]
    pub host: String,
    /// HTTP paths; empty when the rule has no `http` section
    #[serde(default)]
    pub paths: Vec<IngressPath>,
}

/// One routed path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressPath {
    /// Path prefix
    #[serde(default)]
    pub path: String,
    /// Service backend; `None` for resource backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<ServiceBackend>,
}

/// Service a path is routed to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBackend {
    /// Service name in the ingress namespace
    pub name: String,
}

impl IngressResource {
    /// Creates an ingress with no rules.
    pub fn new(uid: impl Into<String>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            namespace: namespace.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds an annotation.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Adds a rule routing each `(path, service)` pair on `host`.
    pub fn with_rule(mut self, host: impl Into<String>, paths: &[(&str, &str)]) -> Self {
        self.rules.push(IngressRule {
            host: host.into(),
            paths: paths
                .iter()
                .map(|(path, service)| IngressPath {
                    path: (*path).to_string(),
                    backend: Some(ServiceBackend {
                        name: (*service).to_string(),
                    }),
                })
                .collect(),
        });
        self
    }

    /// Declares TLS for the given hosts.
    pub fn with_tls(mut self, hosts: &[&str]) -> Self {
        self.tls.push(IngressTls {
            hosts: hosts.iter().map(|h| (*h).to_string()).collect(),
            secret_name: None,
        });
        self
    }

    /// Annotation value, if present.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Ingress class from the spec, or the legacy annotation.
    pub fn class_name(&self) -> String {
        match &self.ingress_class_name {
            Some(name) => name.clone(),
            None => self.annotation(ANNO_INGRESS_CLASS).unwrap_or_default().to_string(),
        }
    }

    /// Whether the ingress declares TLS material.
    pub fn is_secure(&self) -> bool {
        !self.tls.is_empty()
    }

    /// Sort key of the derived record.
    pub fn sort_key(&self) -> String {
        sort_key(&self.namespace, &self.name)
    }

    /// All routed paths in rule order.
    pub fn paths(&self) -> impl Iterator<Item = &IngressPath> {
        self.rules.iter().flat_map(|rule| rule.paths.iter())
    }
}

/// Addressing information of a backend service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSummary {
    /// `spec.clusterIPs`
    #[serde(default)]
    pub cluster_ips: Vec<String>,
    /// `spec.externalIPs`
    #[serde(default)]
    pub external_ips: Vec<String>,
    /// `spec.externalName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_name: Option<String>,
}

impl ServiceSummary {
    /// Number of reachable endpoints.
    ///
    /// Cluster IPs plus external IPs; a service referenced only by external
    /// DNS name counts as one so it is never reported unreachable.
    pub fn endpoint_count(&self) -> usize {
        let has_alias = self
            .external_name
            .as_deref()
            .map(|name| !name.is_empty())
            .unwrap_or(false);
        let external = if self.external_ips.is_empty() && has_alias {
            1
        } else {
            self.external_ips.len()
        };
        self.cluster_ips.len() + external
    }
}

/// Payload of a watch callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchObject {
    /// An ingress
    Ingress(IngressResource),
    /// Any other kind delivered on the same channel
    Other {
        /// Kind reported by the source
        kind: String,
    },
}

impl WatchObject {
    /// Returns the ingress if the payload has the expected shape.
    pub fn as_ingress(&self) -> Option<&IngressResource> {
        match self {
            WatchObject::Ingress(ingress) => Some(ingress),
            WatchObject::Other { .. } => None,
        }
    }

    /// Kind of the payload.
    pub fn kind(&self) -> &str {
        match self {
            WatchObject::Ingress(_) => "Ingress",
            WatchObject::Other { kind } => kind,
        }
    }
}

impl From<IngressResource> for WatchObject {
    fn from(ingress: IngressResource) -> Self {
        WatchObject::Ingress(ingress)
    }
}

/// One callback from an event source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchEvent {
    /// Object appeared
    Added(WatchObject),
    /// Object changed
    Updated {
        /// Previous state
        old: WatchObject,
        /// Current state
        new: WatchObject,
    },
    /// Object disappeared
    Deleted(WatchObject),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_count_cluster_ips() {
        let svc = ServiceSummary {
            cluster_ips: vec!["10.0.0.1".into(), "fd00::1".into()],
            ..Default::default()
        };
        assert_eq!(svc.endpoint_count(), 2);
    }

    #[test]
    fn test_endpoint_count_external_name_counts_once() {
        let svc = ServiceSummary {
            external_name: Some("db.example.com".into()),
            ..Default::default()
        };
        assert_eq!(svc.endpoint_count(), 1);

        let empty_alias = ServiceSummary {
            external_name: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(empty_alias.endpoint_count(), 0);
    }

    #[test]
    fn test_endpoint_count_external_ips_win_over_alias() {
        let svc = ServiceSummary {
            cluster_ips: vec!["10.0.0.1".into()],
            external_ips: vec!["1.2.3.4".into(), "1.2.3.5".into()],
            external_name: Some("ignored.example.com".into()),
        };
        assert_eq!(svc.endpoint_count(), 3);
    }

    #[test]
    fn test_class_name() {
        let legacy = IngressResource::new("u", "ns", "n").with_annotation(ANNO_INGRESS_CLASS, "nginx");
        assert_eq!(legacy.class_name(), "nginx");

        let mut spec = legacy.clone();
        spec.ingress_class_name = Some("traefik".into());
        assert_eq!(spec.class_name(), "traefik");

        assert_eq!(IngressResource::new("u", "ns", "n").class_name(), "");
    }

    #[test]
    fn test_watch_object_shape() {
        let obj: WatchObject = IngressResource::new("u", "ns", "n").into();
        assert!(obj.as_ingress().is_some());
        assert_eq!(obj.kind(), "Ingress");

        let other = WatchObject::Other { kind: "IngressClass".into() };
        assert!(other.as_ingress().is_none());
        assert_eq!(other.kind(), "IngressClass");
    }

    #[test]
    fn test_paths_in_rule_order() {
        let ing = IngressResource::new("u", "ns", "n")
            .with_rule("a.example.com", &[("/", "web"), ("/api", "api")])
            .with_rule("b.example.com", &[("/", "web")]);
        let paths: Vec<_> = ing.paths().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/api", "/"]);
    }
}
