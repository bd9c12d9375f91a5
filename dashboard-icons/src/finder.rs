//! HTTP side of icon discovery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use dashboard_core::constants::{DEFAULT_NETWORK_TIMEOUT_SECS, FAVICON_PATH};
use dashboard_core::error::{DashboardError, Result};
use dashboard_core::traits::IconSource;

use crate::html::{find_icon, normalize_href};

/// Icon finder configuration.
#[derive(Clone, Debug)]
pub struct IconConfig {
    /// Bound for each HTTP request
    pub timeout: Duration,
    /// `User-Agent` sent with every request
    pub user_agent: String,
    /// Probe `/favicon.ico` when the page gives no hint
    pub favicon_fallback: bool,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_NETWORK_TIMEOUT_SECS),
            user_agent: concat!("ingress-dashboard/", env!("CARGO_PKG_VERSION")).into(),
            favicon_fallback: true,
        }
    }
}

impl IconConfig {
    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables the favicon fallback.
    pub fn with_favicon_fallback(mut self, enabled: bool) -> Self {
        self.favicon_fallback = enabled;
        self
    }
}

/// Discovers page icons over HTTP.
pub struct IconFinder {
    config: IconConfig,
    http_client: reqwest::Client,
}

impl IconFinder {
    /// Creates a finder with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(IconConfig::default())
    }

    /// Creates a finder with custom configuration.
    pub fn with_config(config: IconConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DashboardError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Finds an icon for `page_url`.
    ///
    /// Tries the page head first, then `<page_url>/favicon.ico`. Failures are
    /// logged and yield `None`.
    #[instrument(skip(self))]
    pub async fn discover(&self, page_url: &str) -> Option<String> {
        match self.page_icon(page_url).await {
            Ok(icon) => {
                debug!(page_url, icon = %icon, "Found icon in page head");
                return Some(icon);
            }
            Err(e) => warn!(page_url, error = %e, "Icon detection from main page failed"),
        }

        if !self.config.favicon_fallback {
            return None;
        }

        match self.favicon(page_url).await {
            Ok(icon) => {
                debug!(page_url, icon = %icon, "Using favicon fallback");
                Some(icon)
            }
            Err(e) => {
                debug!(page_url, error = %e, "No favicon");
                None
            }
        }
    }

    /// Reads the icon hint from the page head.
    ///
    /// Relative hints are returned domain-relative (`/path`).
    pub async fn page_icon(&self, page_url: &str) -> Result<String> {
        let body = self.fetch(page_url).await?.text().await.map_err(|e| {
            DashboardError::HttpError(format!("read {}: {}", page_url, e))
        })?;

        let href = find_icon(&body).ok_or_else(|| DashboardError::NoIconFound(page_url.to_string()))?;
        Ok(normalize_href(&href))
    }

    /// Checks the conventional favicon location.
    pub async fn favicon(&self, page_url: &str) -> Result<String> {
        let favicon_url = format!("{}{}", page_url.trim_end_matches('/'), FAVICON_PATH);
        self.fetch(&favicon_url).await?;
        Ok(favicon_url)
    }

    async fn fetch(&self, url: &str) -> Result<reqwest::Response> {
        let response = self.http_client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DashboardError::ConnectionTimeout(url.to_string())
            } else if e.is_builder() {
                DashboardError::InvalidUrl {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            } else {
                DashboardError::HttpError(e.to_string())
            }
        })?;

        if response.status() != StatusCode::OK {
            return Err(DashboardError::UnexpectedStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl IconSource for IconFinder {
    async fn discover(&self, page_url: &str) -> Option<String> {
        IconFinder::discover(self, page_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(server: &MockServer, route: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_icon_from_page_head() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/",
            200,
            r#"<html><head><link rel="icon" href="static/icon.png"></head><body></body></html>"#,
        )
        .await;

        let finder = IconFinder::new().unwrap();
        let icon = finder.discover(&format!("{}/", server.uri())).await;
        assert_eq!(icon.as_deref(), Some("/static/icon.png"));
    }

    #[tokio::test]
    async fn test_absolute_icon_kept() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/",
            200,
            r#"<html><head><link rel="shortcut icon" href="https://cdn.example.com/i.ico"></head></html>"#,
        )
        .await;

        let finder = IconFinder::new().unwrap();
        let icon = finder.discover(&server.uri()).await;
        assert_eq!(icon.as_deref(), Some("https://cdn.example.com/i.ico"));
    }

    #[tokio::test]
    async fn test_favicon_fallback_on_non_200() {
        let server = MockServer::start().await;
        serve(&server, "/", 503, "down").await;
        serve(&server, "/favicon.ico", 200, "ico").await;

        let finder = IconFinder::new().unwrap();
        let icon = finder.discover(&server.uri()).await;
        assert_eq!(icon, Some(format!("{}/favicon.ico", server.uri())));
    }

    #[tokio::test]
    async fn test_favicon_fallback_when_no_hint() {
        let server = MockServer::start().await;
        serve(&server, "/", 200, "<html><head><title>x</title></head></html>").await;
        serve(&server, "/favicon.ico", 200, "ico").await;

        let finder = IconFinder::new().unwrap();
        let icon = finder.discover(&format!("{}/", server.uri())).await;
        assert_eq!(icon, Some(format!("{}/favicon.ico", server.uri())));
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let server = MockServer::start().await;
        serve(&server, "/", 404, "").await;

        let finder = IconFinder::new().unwrap();
        assert_eq!(finder.discover(&server.uri()).await, None);
    }

    #[tokio::test]
    async fn test_fallback_disabled() {
        let server = MockServer::start().await;
        serve(&server, "/", 404, "").await;
        serve(&server, "/favicon.ico", 200, "ico").await;

        let finder = IconFinder::with_config(IconConfig::default().with_favicon_fallback(false)).unwrap();
        assert_eq!(finder.discover(&server.uri()).await, None);
    }

    #[tokio::test]
    async fn test_page_icon_errors() {
        let server = MockServer::start().await;
        serve(&server, "/missing", 404, "").await;
        serve(&server, "/plain", 200, "no markup here").await;

        let finder = IconFinder::new().unwrap();

        let err = finder.page_icon(&format!("{}/missing", server.uri())).await.unwrap_err();
        assert!(matches!(err, DashboardError::UnexpectedStatus { status: 404, .. }));

        let err = finder.page_icon(&format!("{}/plain", server.uri())).await.unwrap_err();
        assert!(matches!(err, DashboardError::NoIconFound(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let finder =
            IconFinder::with_config(IconConfig::default().with_timeout(Duration::from_millis(100))).unwrap();
        let err = finder.page_icon(&server.uri()).await.unwrap_err();
        assert!(matches!(err, DashboardError::ConnectionTimeout(_)));
    }
}
