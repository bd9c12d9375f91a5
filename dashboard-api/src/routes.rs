//! API route configuration.

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // Snapshot
        .route("/api/v1/ingresses", get(handlers::list_ingresses))
        .route("/api/v1/ingresses/:id", get(handlers::get_ingress))

        .with_state(state)
}
