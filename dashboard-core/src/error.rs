//! Error types for the dashboard.
//!
//! This module provides the error hierarchy using `thiserror`.
//! Nothing in the enrichment engine is fatal: callers log these errors and
//! defer the work to the next pass.

use thiserror::Error;

/// Result type alias using `DashboardError`.
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Main error type for all dashboard operations.
#[derive(Debug, Error)]
pub enum DashboardError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CLUSTER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Backend service does not exist.
    #[error("Service {name} not found in {namespace}")]
    ServiceNotFound { namespace: String, name: String },

    /// Cluster query failed.
    #[error("Get service {name} in {namespace}: {reason}")]
    ClusterQueryFailed {
        namespace: String,
        name: String,
        reason: String,
    },

    /// Watch stream failed.
    #[error("Event source error: {0}")]
    EventSourceError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // ICON DISCOVERY ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Page answered with something other than 200.
    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    /// Page has no usable icon hint in its head.
    #[error("No logo in meta of {0}")]
    NoIconFound(String),

    /// Invalid URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════════
    // TLS ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// TLS dial or handshake failed.
    #[error("Dial {host}: {reason}")]
    TlsDialFailed { host: String, reason: String },

    /// Host cannot be used as a TLS server name.
    #[error("Invalid hostname: {0}")]
    InvalidHostname(String),

    /// Peer certificate could not be decoded.
    #[error("Certificate parse error: {0}")]
    CertificateParseError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // NETWORK ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Connection timeout.
    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // DEFINITION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Static definition is malformed.
    #[error("Invalid definition in {path}: {reason}")]
    InvalidDefinition { path: String, reason: String },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION & LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Operation was interrupted by shutdown.
    #[error("Cancelled")]
    Cancelled,

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}
