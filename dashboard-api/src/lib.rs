//! # Dashboard API Server
//!
//! Read-only JSON API over the latest published snapshot.
//!
//! ## Endpoints
//!
//! - `GET /health` - Liveness and snapshot size
//! - `GET /api/v1/ingresses` - Visible records (`?all=true` includes hidden ones)
//! - `GET /api/v1/ingresses/:id` - One record by `namespace.name`
//!
//! ## Example
//!
//! ```rust,ignore
//! use dashboard_api::{ApiConfig, ApiServer, DashboardState};
//!
//! let dashboard = Arc::new(DashboardState::new());
//! // hand `dashboard.clone()` to the engine as its receiver
//! ApiServer::new(ApiConfig::default(), dashboard).run().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dto;
mod error;
mod handlers;
mod routes;
mod state;

pub use dto::{HealthResponse, IngressListResponse, IngressResponse, ReferenceResponse};
pub use error::ApiError;
pub use routes::create_router;
pub use state::{ApiConfig, AppState, DashboardState};

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server over a [`DashboardState`].
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server publishing `dashboard`.
    pub fn new(config: ApiConfig, dashboard: Arc<DashboardState>) -> Self {
        Self {
            state: Arc::new(AppState::new(config, dashboard)),
        }
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let router = create_router(self.state.clone());
        let router = if self.state.config.allow_any_origin {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router.layer(cors)
        } else {
            router
        };
        router.layer(TraceLayer::new_for_http())
    }

    /// Runs the server until the process is killed.
    pub async fn run(self) -> std::io::Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the server until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.config.addr;
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Dashboard API listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}
