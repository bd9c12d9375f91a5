//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use tracing::debug;

use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// GET /api/v1/ingresses
pub async fn list_ingresses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListIngressesQuery>,
) -> Json<IngressListResponse> {
    let records = state.dashboard.records();
    let now = Utc::now();

    let ingresses: Vec<IngressResponse> = records
        .iter()
        .filter(|r| query.all || !r.hidden)
        .filter(|r| query.namespace.as_deref().map_or(true, |ns| r.namespace == ns))
        .map(|r| IngressResponse::from_record(r, now))
        .collect();

    debug!(count = ingresses.len(), all = query.all, "Listed ingresses");

    Json(IngressListResponse {
        total: ingresses.len(),
        ingresses,
        updated_at: state.dashboard.updated_at(),
    })
}

/// GET /api/v1/ingresses/:id
pub async fn get_ingress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<IngressResponse>> {
    let records = state.dashboard.records();
    let record = records
        .iter()
        .find(|r| r.id == id)
        .ok_or_else(|| ApiError::not_found(format!("Ingress {} not found", id)))?;

    Ok(Json(IngressResponse::from_record(record, Utc::now())))
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.started.elapsed().as_secs(),
        ingresses: state.dashboard.records().len(),
        updates: state.dashboard.updates(),
    })
}
