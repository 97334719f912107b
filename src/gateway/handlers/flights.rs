//! Flight query handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use serde::Deserialize;
use utoipa::IntoParams;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, ok};
use crate::core_types::Station;
use crate::flight::Flight;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FlightQuery {
    /// Only flights currently owned by this station (DEL, GND, TWR, APP, CEN)
    pub control: Option<String>,
}

/// List flights
///
/// GET /api/flights?control=GND
#[utoipa::path(
    get,
    path = "/api/flights",
    params(FlightQuery),
    responses(
        (status = 200, description = "Flights in store order", body = Vec<Flight>, content_type = "application/json"),
        (status = 400, description = "Unknown station code")
    ),
    tag = "Flights"
)]
pub async fn get_flights(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FlightQuery>,
) -> ApiResult<Vec<Flight>> {
    match query.control.as_deref() {
        Some(code) => {
            let station = code.parse::<Station>().map_err(ApiError::from)?;
            ok(state.coordinator.flights_by_control(station).await)
        }
        None => ok(state.coordinator.flights().await),
    }
}

/// Get a single flight
///
/// GET /api/flights/{id}
#[utoipa::path(
    get,
    path = "/api/flights/{id}",
    params(
        ("id" = String, Path, description = "Flight ID")
    ),
    responses(
        (status = 200, description = "Flight record", body = Flight, content_type = "application/json"),
        (status = 404, description = "Flight not found")
    ),
    tag = "Flights"
)]
pub async fn get_flight(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Flight> {
    let flight = state.coordinator.get_flight(&id).await?;
    ok(flight)
}
