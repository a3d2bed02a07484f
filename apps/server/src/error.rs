//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use lodge_booking::{BookingError, GatewayError};
use lodge_db::DbError;

/// API error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub struct AppError(pub BookingError);

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        AppError(BookingError::Db(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            BookingError::RoomNotFound(_) | BookingError::ReservationNotFound(_) => {
                (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", self.0.to_string()))
            }

            BookingError::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("VALIDATION_FAILED", self.0.to_string()),
            ),

            // Status conflicts and lost write-guard races are the same thing
            // to a client: the resource moved first.
            BookingError::State(_) => (
                StatusCode::CONFLICT,
                ApiError::new("CONFLICT", self.0.to_string()),
            ),
            BookingError::Db(
                DbError::ReservationOverlap | DbError::PeriodOverlap | DbError::BlockedByReservation,
            ) => (
                StatusCode::CONFLICT,
                ApiError::new("CONFLICT", self.0.to_string()),
            ),

            BookingError::Db(DbError::NotFound { .. }) => (
                StatusCode::NOT_FOUND,
                ApiError::new("NOT_FOUND", self.0.to_string()),
            ),

            // Client errors on the webhook path: the gateway must stop
            // retrying, so these are 4xx and never 5xx.
            BookingError::InvalidSignature => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_SIGNATURE", self.0.to_string()),
            ),
            BookingError::MalformedWebhook(_) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("MALFORMED_PAYLOAD", self.0.to_string()),
            ),

            BookingError::Gateway(GatewayError::Rejected(_)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("GATEWAY_REJECTED", self.0.to_string()),
            ),
            BookingError::Gateway(_) => (
                StatusCode::BAD_GATEWAY,
                ApiError::new("GATEWAY_UNAVAILABLE", self.0.to_string()),
            ),

            BookingError::Db(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", "internal error".to_string()),
            ),
        };

        (status, Json(error)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodge_core::ValidationError;

    fn status_of(err: BookingError) -> StatusCode {
        AppError(err).into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(BookingError::RoomNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(BookingError::Validation(ValidationError::NotFullyCovered)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(BookingError::Db(DbError::ReservationOverlap)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(BookingError::InvalidSignature),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(BookingError::Gateway(GatewayError::Unavailable("down".into()))),
            StatusCode::BAD_GATEWAY
        );
    }
}
