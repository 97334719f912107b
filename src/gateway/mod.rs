//! HTTP + WebSocket gateway
//!
//! ```text
//! /ws                   WebSocket: controller and info-screen sessions
//! /health               liveness
//! /api/flights[/{id}]   flight queries
//! /api/sessions         online sessions
//! /api/reconcile        local vs mirror report
//! /api/mirror/*         mirror resync and raw rows
//! /docs                 Swagger UI
//! ```

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::coordinator::HandoffCoordinator;
use crate::websocket::ws_handler;
use state::AppState;

/// Assemble the full router around `coordinator`.
pub fn build_router(coordinator: Arc<HandoffCoordinator>) -> Router {
    let state = Arc::new(AppState::new(coordinator));

    let api_routes = Router::new()
        .route("/flights", get(handlers::get_flights))
        .route("/flights/{id}", get(handlers::get_flight))
        .route("/sessions", get(handlers::get_sessions))
        .route("/reconcile", get(handlers::get_reconcile))
        .route("/mirror/resync", post(handlers::post_mirror_resync))
        .route("/mirror/flights", get(handlers::get_mirror_flights));

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(handlers::health_check))
        .nest("/api", api_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Serve on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, coordinator: Arc<HandoffCoordinator>) -> std::io::Result<()> {
    let app = build_router(coordinator);
    axum::serve(listener, app).await
}

/// Bind `host:port` and serve.
pub async fn run_server(
    host: &str,
    port: u16,
    coordinator: Arc<HandoffCoordinator>,
) -> std::io::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        tracing::error!(addr = %addr, error = %e, "Failed to bind gateway");
        e
    })?;

    tracing::info!(addr = %addr, "Gateway listening");
    tracing::info!("WebSocket endpoint: ws://{}/ws", addr);
    tracing::info!("API Docs: http://{}/docs", addr);

    serve(listener, coordinator).await
}
