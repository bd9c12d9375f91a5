//! TLS dialer reporting certificate expiry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, instrument};

use dashboard_core::constants::{DEFAULT_NETWORK_TIMEOUT_SECS, HTTPS_PORT};
use dashboard_core::error::{DashboardError, Result};
use dashboard_core::traits::CertificateSource;

use crate::chain::{inspect_chain, CertificateInfo};
use crate::verifier::AcceptAnyCertificate;

/// Prober configuration.
#[derive(Clone, Debug)]
pub struct ProberConfig {
    /// Port dialed on every host
    pub port: u16,
    /// Bound for connect plus handshake
    pub timeout: Duration,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            port: HTTPS_PORT,
            timeout: Duration::from_secs(DEFAULT_NETWORK_TIMEOUT_SECS),
        }
    }
}

impl ProberConfig {
    /// Sets the dialed port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the dial timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Dials hosts and reads the certificate chain they present.
pub struct CertificateProber {
    config: ProberConfig,
    connector: TlsConnector,
}

impl CertificateProber {
    /// Creates a prober with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(ProberConfig::default())
    }

    /// Creates a prober with custom configuration.
    pub fn with_config(config: ProberConfig) -> Result<Self> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let verifier = Arc::new(AcceptAnyCertificate::new(
            provider.signature_verification_algorithms,
        ));

        let tls = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| DashboardError::ConfigError(format!("TLS client: {}", e)))?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_no_client_auth();

        Ok(Self {
            config,
            connector: TlsConnector::from(Arc::new(tls)),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ProberConfig {
        &self.config
    }

    /// Dials `host` and inspects the presented chain.
    ///
    /// Validity is not checked. A chain with no certificates yields
    /// `expires_at == None`.
    #[instrument(skip(self))]
    pub async fn probe(&self, host: &str) -> Result<CertificateInfo> {
        if host.is_empty() {
            return Err(DashboardError::InvalidHostname(host.to_string()));
        }
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| DashboardError::InvalidHostname(format!("{}: {}", host, e)))?;

        let dial = async {
            let tcp = TcpStream::connect((host, self.config.port)).await?;
            self.connector.connect(server_name, tcp).await
        };

        let stream = tokio::time::timeout(self.config.timeout, dial)
            .await
            .map_err(|_| {
                DashboardError::ConnectionTimeout(format!("{}:{} after {:?}", host, self.config.port, self.config.timeout))
            })?
            .map_err(|e| DashboardError::TlsDialFailed {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        let (_, session) = stream.get_ref();
        let info = match session.peer_certificates() {
            Some(chain) => inspect_chain(host, chain)?,
            None => CertificateInfo {
                host: host.to_string(),
                ..Default::default()
            },
        };

        debug!(
            host,
            chain_len = info.chain_len,
            expires_at = ?info.expires_at,
            "Probed certificate chain"
        );
        Ok(info)
    }

    /// Earliest certificate expiry presented by `host`.
    pub async fn expiration(&self, host: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.probe(host).await?.expires_at)
    }
}

#[async_trait]
impl CertificateSource for CertificateProber {
    async fn expiration(&self, host: &str) -> Result<Option<DateTime<Utc>>> {
        CertificateProber::expiration(self, host).await
    }
}
