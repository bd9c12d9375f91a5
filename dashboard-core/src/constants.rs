//! Dashboard constants.
//!
//! Annotation keys understood on observed ingresses, background-loop timing,
//! and the icon discovery heuristic.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// ANNOTATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Free-form description shown under the ingress title.
pub const ANNO_DESCRIPTION: &str = "ingress-dashboard/description";

/// Explicit logo URL; skips icon discovery when set.
pub const ANNO_LOGO_URL: &str = "ingress-dashboard/logo-url";

/// Display title, falls back to the resource name.
pub const ANNO_TITLE: &str = "ingress-dashboard/title";

/// Do not display the ingress in the dashboard.
pub const ANNO_HIDE: &str = "ingress-dashboard/hide";

/// Custom ingress URL (load-balancers or reverse-proxies in front of the cluster).
pub const ANNO_URL: &str = "ingress-dashboard/url";

/// Legacy ingress class annotation, used when `spec.ingressClassName` is unset.
pub const ANNO_INGRESS_CLASS: &str = "kubernetes.io/ingress.class";

// ═══════════════════════════════════════════════════════════════════════════════
// BACKGROUND LOOPS
// ═══════════════════════════════════════════════════════════════════════════════

/// Periodic fallback for the certificate scan.
pub const TLS_SCAN_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default bound for a single outbound HTTP request or TLS dial.
pub const DEFAULT_NETWORK_TIMEOUT_SECS: u64 = 30;

/// Certificates expiring within this many days are flagged in the UI.
pub const EXPIRY_WARNING_DAYS: i64 = 14;

/// Port dialed by the certificate prober.
pub const HTTPS_PORT: u16 = 443;

// ═══════════════════════════════════════════════════════════════════════════════
// ICON DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════════

/// `rel` values of head `<link>` elements, highest priority first.
pub const ICON_REL_PRIORITY: [&str; 4] = ["apple-touch-icon", "shortcut icon", "icon", "alternate icon"];

/// Conventional icon location probed when the page gives no hint.
pub const FAVICON_PATH: &str = "/favicon.ico";
