//! Health check handler

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::ApiResponse;

/// Build version reported by `/health`
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("GIT_HASH"));

/// Health check response data
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Logged-in controller sessions
    #[schema(example = 3)]
    pub connected_sessions: usize,
    /// Attached sockets, info screens included
    #[schema(example = 5)]
    pub connections: usize,
    pub timestamp: DateTime<Utc>,
    #[schema(example = 3600)]
    pub uptime_secs: i64,
    pub version: String,
    /// Active mirror backend
    #[schema(example = "tinywebdb")]
    pub mirror: String,
}

/// Health check endpoint
///
/// Liveness only; the mirror is not contacted (see `/api/reconcile`).
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json")
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    let now = Utc::now();
    let coordinator = &state.coordinator;
    Json(ApiResponse::success(HealthResponse {
        status: "ok".to_string(),
        connected_sessions: coordinator.sessions().count(),
        connections: coordinator.connections().count(),
        timestamp: now,
        uptime_secs: (now - state.started_at).num_seconds(),
        version: VERSION.to_string(),
        mirror: coordinator.mirror().backend().to_string(),
    }))
}
