//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:3000/docs`
//! - OpenAPI JSON: `http://localhost:3000/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::core_types::{ControlRole, FlightStatus, Station};
use crate::flight::{Flight, NewFlight, RemarksEdit};
use crate::gateway::handlers::HealthResponse;
use crate::mirror::{
    Discrepancy, DiscrepancyKind, MirrorFailure, MirrorRecord, MirrorRow, ReconcileReport,
    ResyncSummary,
};
use crate::session::Session;

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Flight Handoff API",
        version = "1.0.0",
        description = "Query surface of the flight handoff core. Mutations and live updates go through the WebSocket endpoint at /ws.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::get_flights,
        crate::gateway::handlers::get_flight,
        crate::gateway::handlers::get_sessions,
        crate::gateway::handlers::get_reconcile,
        crate::gateway::handlers::post_mirror_resync,
        crate::gateway::handlers::get_mirror_flights,
    ),
    components(
        schemas(
            HealthResponse,
            Flight,
            NewFlight,
            RemarksEdit,
            Station,
            ControlRole,
            FlightStatus,
            Session,
            ReconcileReport,
            Discrepancy,
            DiscrepancyKind,
            MirrorFailure,
            MirrorRecord,
            MirrorRow,
            ResyncSummary,
        )
    ),
    tags(
        (name = "Flights", description = "Flight set queries"),
        (name = "Sessions", description = "Online controller sessions"),
        (name = "Mirror", description = "External mirror diagnostics"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;
