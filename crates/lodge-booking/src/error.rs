//! # Booking Service Errors
//!
//! The service-level error type folding together domain, storage and
//! gateway failures.

use thiserror::Error;

use lodge_core::{CoreError, StateError, ValidationError};
use lodge_db::DbError;

use crate::gateway::GatewayError;

/// Errors surfaced by the booking services.
#[derive(Debug, Error)]
pub enum BookingError {
    /// Room does not exist.
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Reservation does not exist.
    #[error("Reservation not found: {0}")]
    ReservationNotFound(String),

    /// Input failed domain validation (dates, coverage, add-ons).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The reservation's status does not permit the operation.
    #[error(transparent)]
    State(#[from] StateError),

    /// Storage failure, including write-time guard rejections.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Payment gateway failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Webhook payload could not be authenticated.
    #[error("Webhook signature verification failed")]
    InvalidSignature,

    /// Webhook payload could not be parsed.
    #[error("Malformed webhook payload: {0}")]
    MalformedWebhook(String),
}

impl From<CoreError> for BookingError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => BookingError::Validation(e),
            CoreError::State(e) => BookingError::State(e),
        }
    }
}

/// Result type for booking operations.
pub type BookingResult<T> = Result<T, BookingError>;
