//! # Domain Types
//!
//! Core domain types for the reservation engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Room       │   │  PricedPeriod   │   │   Reservation   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  owner_id       │1─*│  room_id (FK)   │   │  room_id (FK)   │       │
//! │  │  add_ons        │   │  [start, end)   │   │  [start, end)   │       │
//! │  │  capacity       │   │  nightly price  │   │  status + price │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Room 1─* PricedPeriod    Room 1─* Reservation                         │
//! │  Reservations reference the Room, never a PricedPeriod: splitting a    │
//! │  period transfers no reservation data.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has an immutable UUID v4 `id`. Reservations additionally
//! carry external payment references (checkout session, payment intent,
//! refund) that act as idempotency keys for gateway events.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::DateInterval;
use crate::money::Money;

// =============================================================================
// Add-On
// =============================================================================

/// An optional add-on charge (e.g. breakfast, late checkout).
///
/// Rooms carry a catalog of at most [`crate::MAX_SELECTED_ADD_ONS`] add-ons;
/// a reservation snapshots the selected entries at creation time after
/// validating them against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOn {
    pub name: String,
    /// Price in cents (smallest currency unit).
    pub price_cents: i64,
    pub currency: String,
}

impl AddOn {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Room
// =============================================================================

/// A rentable room published by an operator.
///
/// Availability and pricing are carried by [`PricedPeriod`]s, never by the
/// room itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Operator who owns and manages this room.
    pub owner_id: String,

    /// Display name.
    pub name: String,

    /// Sleeping capacity, if declared.
    pub capacity: Option<i64>,

    /// Catalog of optional add-on charges (≤ 5).
    pub add_ons: Vec<AddOn>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Priced Period
// =============================================================================

/// An operator-defined stretch of calendar time during which a room is
/// bookable at a fixed nightly rate.
///
/// Invariants:
/// - `end_date > start_date` (half-open `[start_date, end_date)`)
/// - for a given room, no two periods overlap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PricedPeriod {
    pub id: String,
    pub room_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Nightly rate in cents, strictly positive.
    pub nightly_price_cents: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PricedPeriod {
    /// Returns the nightly rate as Money.
    #[inline]
    pub fn nightly_price(&self) -> Money {
        Money::from_cents(self.nightly_price_cents)
    }

    /// The period as a half-open interval.
    #[inline]
    pub fn interval(&self) -> DateInterval {
        DateInterval {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// Whether a night starting on `date` is priced by this period.
    #[inline]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date < self.end_date
    }
}

// =============================================================================
// Reservation Status
// =============================================================================

/// The lifecycle status of a reservation.
///
/// ```text
/// requested ──► approved_pending_payment ──► confirmed_paid ──► refunded
///     │                    │
///     ├──► declined        ├──► canceled
///     └──► canceled        └──► expired (time-driven)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Guest asked for the dates; awaiting an operator decision.
    Requested,
    /// Operator approved; guest has until the payment deadline to pay.
    ApprovedPendingPayment,
    /// Payment confirmed by the gateway.
    ConfirmedPaid,
    /// Operator turned the request down (terminal).
    Declined,
    /// Guest or operator canceled before payment (terminal).
    Canceled,
    /// Payment deadline elapsed without payment (terminal).
    Expired,
    /// Paid reservation was refunded (terminal).
    Refunded,
}

impl ReservationStatus {
    /// Statuses that block overlapping new reservations AND block
    /// priced-period edits.
    pub const RESERVED: [ReservationStatus; 2] = [
        ReservationStatus::ApprovedPendingPayment,
        ReservationStatus::ConfirmedPaid,
    ];

    /// Statuses that block priced-period edits: the reserved set plus
    /// `requested` (a pending request must not have its dates pulled away).
    pub const BLOCKS_PERIOD_EDITS: [ReservationStatus; 3] = [
        ReservationStatus::Requested,
        ReservationStatus::ApprovedPendingPayment,
        ReservationStatus::ConfirmedPaid,
    ];

    /// Whether this status excludes overlapping new reservations.
    #[inline]
    pub fn is_reserved(&self) -> bool {
        Self::RESERVED.contains(self)
    }

    /// Whether this status blocks shrinking/deleting a priced period.
    #[inline]
    pub fn blocks_period_edits(&self) -> bool {
        Self::BLOCKS_PERIOD_EDITS.contains(self)
    }

    /// The snake_case wire/storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Requested => "requested",
            ReservationStatus::ApprovedPendingPayment => "approved_pending_payment",
            ReservationStatus::ConfirmedPaid => "confirmed_paid",
            ReservationStatus::Declined => "declined",
            ReservationStatus::Canceled => "canceled",
            ReservationStatus::Expired => "expired",
            ReservationStatus::Refunded => "refunded",
        }
    }
}

impl Default for ReservationStatus {
    fn default() -> Self {
        ReservationStatus::Requested
    }
}

// =============================================================================
// Actor
// =============================================================================

/// The party performing a lifecycle operation.
///
/// Approve/decline require the operator; cancel is open to both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// The room's operator (supply side).
    Operator { id: String },
    /// The guest who requested the stay.
    Guest { id: String },
}

impl Actor {
    #[inline]
    pub fn is_operator(&self) -> bool {
        matches!(self, Actor::Operator { .. })
    }
}

// =============================================================================
// Reservation
// =============================================================================

/// A guest's reservation of a room for a half-open date range.
///
/// Pricing is computed once at creation (via the quote) and persisted; it is
/// never recomputed against later rate changes. Rows are never physically
/// deleted: cancellation/decline/expiry are terminal statuses, not removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub room_id: String,
    pub guest_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ReservationStatus,
    /// Total price in cents, frozen at creation (stay + add-ons).
    pub total_price_cents: i64,
    pub currency: String,
    /// Add-ons selected at creation, snapshotted after catalog validation.
    pub selected_add_ons: Vec<AddOn>,

    // Lifecycle timestamps
    pub approved_at: Option<DateTime<Utc>>,
    pub payment_deadline: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub status_changed_at: DateTime<Utc>,
    pub review_request_sent_at: Option<DateTime<Utc>>,

    // External payment references (idempotency keys, each globally unique
    // when present)
    pub checkout_session_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub refund_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Number of nights booked.
    #[inline]
    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// The stay as a half-open interval.
    #[inline]
    pub fn interval(&self) -> DateInterval {
        DateInterval {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// Returns the frozen total as Money.
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }

    /// Sum of the snapshotted add-on prices.
    pub fn add_on_total(&self) -> Money {
        self.selected_add_ons
            .iter()
            .fold(Money::zero(), |acc, a| acc + a.price())
    }

    /// Whether the guest can still pay: approved and before the deadline.
    pub fn payment_window_open(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::ApprovedPendingPayment
            && self.payment_deadline.map(|d| now < d).unwrap_or(false)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    #[test]
    fn test_reserved_statuses() {
        assert!(ReservationStatus::ApprovedPendingPayment.is_reserved());
        assert!(ReservationStatus::ConfirmedPaid.is_reserved());
        assert!(!ReservationStatus::Requested.is_reserved());
        assert!(!ReservationStatus::Expired.is_reserved());
    }

    #[test]
    fn test_requested_blocks_period_edits_but_is_not_reserved() {
        let s = ReservationStatus::Requested;
        assert!(s.blocks_period_edits());
        assert!(!s.is_reserved());
    }

    #[test]
    fn test_status_default_and_str() {
        assert_eq!(ReservationStatus::default(), ReservationStatus::Requested);
        assert_eq!(
            ReservationStatus::ApprovedPendingPayment.as_str(),
            "approved_pending_payment"
        );
    }

    #[test]
    fn test_period_covers() {
        let period = PricedPeriod {
            id: "p1".into(),
            room_id: "r1".into(),
            start_date: d(10),
            end_date: d(20),
            nightly_price_cents: 10000,
            currency: "EUR".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(period.covers(d(10)));
        assert!(period.covers(d(19)));
        assert!(!period.covers(d(20))); // end exclusive
        assert!(!period.covers(d(9)));
    }
}
