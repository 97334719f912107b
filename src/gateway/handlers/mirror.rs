//! Mirror diagnostics handlers

use std::sync::Arc;

use axum::extract::State;

use super::super::state::AppState;
use super::super::types::{ApiResult, ok};
use crate::mirror::{MirrorRow, ReconcileReport, ResyncSummary};

/// Compare the local flight set with the mirror
///
/// GET /api/reconcile
#[utoipa::path(
    get,
    path = "/api/reconcile",
    responses(
        (status = 200, description = "Reconcile report", body = ReconcileReport, content_type = "application/json"),
        (status = 503, description = "Mirror unreachable")
    ),
    tag = "Mirror"
)]
pub async fn get_reconcile(State(state): State<Arc<AppState>>) -> ApiResult<ReconcileReport> {
    let report = state.coordinator.reconcile().await?;
    ok(report)
}

/// Push every local flight to the mirror
///
/// POST /api/mirror/resync
#[utoipa::path(
    post,
    path = "/api/mirror/resync",
    responses(
        (status = 200, description = "Resync summary", body = ResyncSummary, content_type = "application/json")
    ),
    tag = "Mirror"
)]
pub async fn post_mirror_resync(State(state): State<Arc<AppState>>) -> ApiResult<ResyncSummary> {
    ok(state.coordinator.resync().await)
}

/// Raw decoded mirror contents
///
/// GET /api/mirror/flights
#[utoipa::path(
    get,
    path = "/api/mirror/flights",
    responses(
        (status = 200, description = "Mirror rows keyed by callsign", body = Vec<MirrorRow>, content_type = "application/json"),
        (status = 503, description = "Mirror unreachable")
    ),
    tag = "Mirror"
)]
pub async fn get_mirror_flights(State(state): State<Arc<AppState>>) -> ApiResult<Vec<MirrorRow>> {
    let rows = state.coordinator.mirror_rows().await?;
    ok(rows)
}
