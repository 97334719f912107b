use std::sync::Arc;

use axum::extract::State;

use super::super::state::AppState;
use super::super::types::{ApiResult, ok};
use crate::session::Session;

/// Online controller sessions, oldest login first
#[utoipa::path(
    get,
    path = "/api/sessions",
    responses(
        (status = 200, description = "Active sessions", body = Vec<Session>, content_type = "application/json")
    ),
    tag = "Sessions"
)]
pub async fn get_sessions(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Session>> {
    ok(state.coordinator.sessions().all())
}
