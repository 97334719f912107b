//! API response wrapper, error mapping and error codes

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::flight::FlightError;
use crate::mirror::MirrorError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or absent (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = 0)]
    pub code: i32,
    #[schema(example = "ok")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error returned by a handler, rendered as `ApiResponse<()>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }
}

impl From<FlightError> for ApiError {
    fn from(e: FlightError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = match e {
            FlightError::FlightNotFound(_) => error_codes::FLIGHT_NOT_FOUND,
            FlightError::DuplicateCallsign(_) => error_codes::DUPLICATE_CALLSIGN,
            FlightError::InvalidStation(_) => error_codes::INVALID_STATION,
            FlightError::InvalidFlight(_) => error_codes::INVALID_FLIGHT,
            FlightError::CorruptSnapshot { .. } | FlightError::Persistence(_) => {
                error_codes::INTERNAL_ERROR
            }
        };
        Self::new(status, code, e.to_string())
    }
}

impl From<MirrorError> for ApiError {
    fn from(e: MirrorError) -> Self {
        Self::service_unavailable(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiResponse::<()>::error(self.code, self.msg)),
        )
            .into_response()
    }
}

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_STATION: i32 = 1002;
    pub const INVALID_FLIGHT: i32 = 1003;

    // Resource errors (4xxx)
    pub const FLIGHT_NOT_FOUND: i32 = 4004;
    pub const DUPLICATE_CALLSIGN: i32 = 4009;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flight_error_mapping() {
        let err = ApiError::from(FlightError::FlightNotFound("42".into()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, error_codes::FLIGHT_NOT_FOUND);
        assert_eq!(err.msg, "Flight not found: 42");

        let err = ApiError::from(FlightError::InvalidStation("XYZ".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, error_codes::INVALID_STATION);

        let err = ApiError::from(MirrorError::Timeout(5000));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_response_shape() {
        let json = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["msg"], "ok");
        assert_eq!(json["data"], serde_json::json!([1, 2]));

        let json = serde_json::to_value(ApiResponse::<()>::error(4004, "gone")).unwrap();
        assert!(json.get("data").is_none());
    }
}
