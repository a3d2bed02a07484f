//! # Error Types
//!
//! Domain-specific error types for lodge-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lodge-core errors (this file)                                         │
//! │  ├── ValidationError  - Dates, coverage, currency, add-on tampering    │
//! │  ├── StateError       - Wrong actor or wrong status for a transition   │
//! │  └── CoreError        - Umbrella over the two above                    │
//! │                                                                         │
//! │  lodge-db errors (separate crate)                                      │
//! │  └── DbError          - Storage failures + write-time guard conflicts  │
//! │                                                                         │
//! │  lodge-booking errors (separate crate)                                 │
//! │  └── BookingError     - Adds gateway + lookup failures                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (dates, amounts, names)
//! 3. Errors are enum variants, never String
//! 4. Validation and state-guard errors are surfaced, never retried

use chrono::NaiveDate;
use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input and business-rule validation errors.
///
/// Always surfaced to the caller with a readable message, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// The end date is not strictly after the start date.
    #[error("End date must be after start date ({start} .. {end})")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// The requested stay is not contiguously covered by priced periods.
    ///
    /// ## When This Occurs
    /// - No period covers the first night
    /// - A gap (even a single day) between consecutive periods
    #[error("Dates are not fully covered by the room's priced periods")]
    NotFullyCovered,

    /// The priced periods spanned by a stay use more than one currency.
    #[error("Priced periods mix currencies: {first} vs {second}")]
    CurrencyMismatch { first: String, second: String },

    /// The candidate range overlaps a reservation in a reserved status.
    #[error("Dates overlap an existing reservation")]
    OverlapsReservation,

    /// More add-ons selected than the catalog allows.
    #[error("At most {max} add-ons may be selected")]
    TooManyAddOns { max: usize },

    /// Selected add-on is not in the room's catalog.
    #[error("Unknown add-on: {name}")]
    UnknownAddOn { name: String },

    /// Selected add-on price does not match the catalog price.
    #[error("Add-on '{name}' price does not match the catalog")]
    AddOnPriceMismatch { name: String },

    /// Selected add-on currency does not match the catalog currency.
    #[error("Add-on '{name}' currency does not match the catalog")]
    AddOnCurrencyMismatch { name: String },

    /// A sub-range to block falls outside its priced period.
    #[error("Block range must be inside the priced period")]
    BlockOutsidePeriod,
}

// =============================================================================
// State Error
// =============================================================================

/// State-machine guard violations.
///
/// Surfaced as authorization/precondition failures, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The acting party is not allowed to perform this transition.
    #[error("Only an operator can {action} a reservation")]
    WrongActor { action: &'static str },

    /// The reservation is not in a status that allows this transition.
    #[error("Cannot {action} a reservation in status '{current}'")]
    WrongStatus {
        action: &'static str,
        current: &'static str,
    },

    /// A refund was requested but no payment reference is recorded.
    #[error("Missing payment reference")]
    PaymentReferenceMissing,

    /// A refund reference is already recorded for this reservation.
    ///
    /// Checked via the presence of the refund id, not only the status,
    /// to resist double-submission races.
    #[error("Reservation is already refunded")]
    AlreadyRefunded,

    /// The partial refund amount is not a positive integer.
    #[error("Refund amount must be positive")]
    RefundAmountInvalid,

    /// The refund amount exceeds the reservation total.
    #[error("Refund amount {requested} exceeds reservation total {total}")]
    RefundExceedsTotal { requested: i64, total: i64 },

    /// The refund amount exceeds what the gateway actually captured.
    #[error("Refund amount {requested} exceeds captured amount {captured}")]
    RefundExceedsCaptured { requested: i64, captured: i64 },
}

// =============================================================================
// Core Error
// =============================================================================

/// Umbrella error for the pure business logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StateError::WrongStatus {
            action: "approve",
            current: "confirmed_paid",
        };
        assert_eq!(
            err.to_string(),
            "Cannot approve a reservation in status 'confirmed_paid'"
        );

        let err = ValidationError::UnknownAddOn {
            name: "breakfast".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown add-on: breakfast");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::NotFullyCovered;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
