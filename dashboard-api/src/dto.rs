//! DTOs for API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dashboard_core::types::{Record, Reference};

/// One dashboard entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngressResponse {
    /// Sort key (`namespace.name`)
    pub id: String,
    /// Resource name
    pub name: String,
    /// Resource namespace
    pub namespace: String,
    /// Ingress class
    pub class: String,
    /// Title, or the name when no title is set
    pub label: String,
    /// Free-form description
    pub description: String,
    /// Logo URL resolved against the first reference; empty when unknown
    pub logo: String,
    /// Hidden from the default listing
    pub hidden: bool,
    /// Declares TLS
    pub tls: bool,
    /// Earliest certificate expiry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_expiration: Option<DateTime<Utc>>,
    /// Certificate expires within the warning window
    pub expires_soon: bool,
    /// Defined statically rather than observed in the cluster
    pub is_static: bool,
    /// Links
    pub refs: Vec<ReferenceResponse>,
}

impl IngressResponse {
    /// Builds the DTO, evaluating expiry against `now`.
    pub fn from_record(record: &Record, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            namespace: record.namespace.clone(),
            class: record.class.clone(),
            label: record.label().to_string(),
            description: record.description.clone(),
            logo: record.logo(),
            hidden: record.hidden,
            tls: record.tls,
            tls_expiration: record.tls_expiration,
            expires_soon: record.expires_soon(now),
            is_static: record.is_static(),
            refs: record.refs.iter().map(ReferenceResponse::from).collect(),
        }
    }
}

/// One link of an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceResponse {
    /// Absolute URL
    pub url: String,
    /// Reachable backend endpoints
    pub pods: usize,
    /// Declared by a static definition
    pub is_static: bool,
}

impl From<&Reference> for ReferenceResponse {
    fn from(reference: &Reference) -> Self {
        Self {
            url: reference.url.clone(),
            pods: reference.pods,
            is_static: reference.is_static,
        }
    }
}

/// Response for listing entries.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngressListResponse {
    /// Entries in snapshot order
    pub ingresses: Vec<IngressResponse>,
    /// Number of entries returned
    pub total: usize,
    /// When the snapshot was published
    pub updated_at: Option<DateTime<Utc>>,
}

/// Query parameters for listing entries.
#[derive(Debug, Default, Deserialize)]
pub struct ListIngressesQuery {
    /// Include hidden entries
    #[serde(default)]
    pub all: bool,
    /// Only entries in this namespace
    pub namespace: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status
    pub status: String,
    /// Version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Entries in the latest snapshot
    pub ingresses: usize,
    /// Snapshots published so far
    pub updates: u64,
}
