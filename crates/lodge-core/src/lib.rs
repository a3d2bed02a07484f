//! # lodge-core: Pure Business Logic for Lodge
//!
//! This crate is the **heart** of the Lodge reservation engine. It contains
//! all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Lodge Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              HTTP entry points (apps/server)                    │   │
//! │  │    booking request ── webhook receiver ── maintenance sweeps    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              lodge-booking (orchestration)                      │   │
//! │  │    gateway client, checkout/refund, reconciliation, sweeps      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ lodge-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   dates   │  │   quote   │  │  period   │  │reservation│  │   │
//! │  │   │ intervals │  │  pricing  │  │ blocking  │  │    FSM    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  lodge-db (Database Layer)                      │   │
//! │  │           SQLite queries, migrations, repositories              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`dates`] - Half-open date intervals and normalized range sets
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (Room, PricedPeriod, Reservation, ...)
//! - [`quote`] - Availability pricing (the booking quote)
//! - [`period`] - Priced-period block planning (shrink/delete/split)
//! - [`reservation`] - The reservation state machine
//! - [`validation`] - Add-on catalog validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - time is always
//!    passed in as `now`, never read from a clock
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dates;
pub mod error;
pub mod money;
pub mod period;
pub mod quote;
pub mod reservation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use lodge_core::Money` instead of
// `use lodge_core::money::Money`

pub use dates::{DateInterval, DateRange, DateRangeSet};
pub use error::{CoreError, StateError, ValidationError};
pub use money::Money;
pub use period::{plan_block, BlockPlan};
pub use quote::{quote_stay, Quote, QuoteSegment};
pub use reservation::{transition, CheckoutOutcome, ReservationEvent};
pub use types::*;
pub use validation::validate_selected_add_ons;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Hours a guest has to pay after the operator approves a request.
///
/// ## Business Reason
/// Approved dates are held (they block overlapping reservations), so the
/// hold must be bounded; after 48h the maintenance sweep expires it.
pub const PAYMENT_WINDOW_HOURS: i64 = 48;

/// Maximum add-ons a room may offer and a reservation may select.
pub const MAX_SELECTED_ADD_ONS: usize = 5;

/// Default currency for rooms that do not specify one.
pub const DEFAULT_CURRENCY: &str = "EUR";
