//! Enriched records published to the dashboard.
//!
//! A record is derived from one observed ingress (or one static definition)
//! and carries two fields filled in later by background enrichment: the logo
//! URL and the earliest certificate expiry.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::EXPIRY_WARNING_DAYS;

/// One externally reachable URL an ingress routes to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Absolute URL
    pub url: String,
    /// Number of reachable backend endpoints behind the URL
    #[serde(default)]
    pub pods: usize,
    /// Declared by a static definition rather than observed in the cluster
    #[serde(default)]
    pub is_static: bool,
}

impl Reference {
    /// Creates a reference with no known endpoints.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pods: 0,
            is_static: false,
        }
    }

    /// Creates a reference coming from a static definition.
    pub fn fixed(url: impl Into<String>) -> Self {
        Self {
            is_static: true,
            ..Self::new(url)
        }
    }

    /// Sets the endpoint count.
    pub fn with_pods(mut self, pods: usize) -> Self {
        self.pods = pods;
        self
    }

    /// Hostname part of the URL, if the URL parses and has one.
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
    }
}

/// An enriched record, one per observed resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identity of the underlying resource; empty for static entries
    #[serde(default)]
    pub uid: String,
    /// Sort key (`namespace.name`)
    pub id: String,
    /// Resource name
    pub name: String,
    /// Resource namespace
    pub namespace: String,
    /// Ingress class
    #[serde(default)]
    pub class: String,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Logo URL; sticky once discovered
    #[serde(default)]
    pub logo_url: String,
    /// Hidden from the dashboard
    #[serde(default)]
    pub hidden: bool,
    /// Ordered references
    #[serde(default)]
    pub refs: Vec<Reference>,
    /// Resource declares TLS material
    #[serde(default)]
    pub tls: bool,
    /// Earliest certificate expiry across referenced hosts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_expiration: Option<DateTime<Utc>>,
}

impl Record {
    /// Creates an empty record for the given identity.
    pub fn new(uid: impl Into<String>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let name = name.into();
        Self {
            uid: uid.into(),
            id: sort_key(&namespace, &name),
            name,
            namespace,
            ..Default::default()
        }
    }

    /// Title if set, otherwise the resource name.
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.name
        } else {
            &self.title
        }
    }

    /// Logo URL ready for display.
    ///
    /// Domain-relative logos (`/icon.png`) are resolved against the origin of
    /// the first reference.
    pub fn logo(&self) -> String {
        if !self.logo_url.starts_with('/') {
            return self.logo_url.clone();
        }
        self.refs
            .first()
            .and_then(|r| Url::parse(&r.url).ok())
            .and_then(|base| base.join(&self.logo_url).ok())
            .map(String::from)
            .unwrap_or_else(|| self.logo_url.clone())
    }

    /// Whether the logo loop should try to discover an icon.
    pub fn needs_logo(&self) -> bool {
        !self.hidden && self.logo_url.is_empty() && !self.refs.is_empty()
    }

    /// Static entries have no cluster identity.
    pub fn is_static(&self) -> bool {
        self.uid.is_empty()
    }

    /// Certificate expires within the warning window (or already expired).
    pub fn expires_soon(&self, now: DateTime<Utc>) -> bool {
        self.tls_expiration
            .map(|at| at - now < Duration::days(EXPIRY_WARNING_DAYS))
            .unwrap_or(false)
    }
}

/// Builds the sort key used to order snapshots.
pub fn sort_key(namespace: &str, name: &str) -> String {
    format!("{}.{}", namespace, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_falls_back_to_name() {
        let mut record = Record::new("u1", "default", "grafana");
        assert_eq!(record.label(), "grafana");

        record.title = "Grafana".into();
        assert_eq!(record.label(), "Grafana");
    }

    #[test]
    fn test_logo_relative_to_first_reference() {
        let mut record = Record::new("u1", "default", "app");
        record.refs.push(Reference::new("https://app.example.com/sub/path"));
        record.refs.push(Reference::new("https://other.example.com/"));

        record.logo_url = "/static/logo.png".into();
        assert_eq!(record.logo(), "https://app.example.com/static/logo.png");

        record.logo_url = "https://cdn.example.com/logo.svg".into();
        assert_eq!(record.logo(), "https://cdn.example.com/logo.svg");
    }

    #[test]
    fn test_logo_without_references() {
        let mut record = Record::new("u1", "default", "app");
        record.logo_url = "/favicon.ico".into();
        assert_eq!(record.logo(), "/favicon.ico");
    }

    #[test]
    fn test_needs_logo() {
        let mut record = Record::new("u1", "default", "app");
        assert!(!record.needs_logo(), "no references");

        record.refs.push(Reference::new("http://app.local/"));
        assert!(record.needs_logo());

        record.hidden = true;
        assert!(!record.needs_logo(), "hidden");

        record.hidden = false;
        record.logo_url = "/logo.png".into();
        assert!(!record.needs_logo(), "already has a logo");
    }

    #[test]
    fn test_expires_soon() {
        let now = Utc::now();
        let mut record = Record::new("u1", "default", "app");
        assert!(!record.expires_soon(now));

        record.tls_expiration = Some(now + Duration::days(30));
        assert!(!record.expires_soon(now));

        record.tls_expiration = Some(now + Duration::days(3));
        assert!(record.expires_soon(now));

        record.tls_expiration = Some(now - Duration::days(1));
        assert!(record.expires_soon(now));
    }

    #[test]
    fn test_reference_host() {
        assert_eq!(
            Reference::new("https://example.com:8443/a/b").host().as_deref(),
            Some("example.com")
        );
        assert_eq!(Reference::new("not a url").host(), None);
    }

    #[test]
    fn test_record_serialization() {
        let mut record = Record::new("u1", "default", "app");
        record.refs.push(Reference::new("https://app.example.com/").with_pods(3));

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("tls_expiration"));

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
