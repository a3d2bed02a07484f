//! # Priced-Period Editing
//!
//! Planning the removal of a sub-range from a priced period.
//!
//! Exactly one branch fires for a valid block request:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  period [10 ──────────────────── 20)                                    │
//! │                                                                         │
//! │  block [10, 20)  →  Delete          (whole period removed)              │
//! │  block [10, 13)  →  ShrinkStart     period becomes [13, 20)             │
//! │  block [17, 20)  →  ShrinkEnd       period becomes [10, 17)             │
//! │  block [12, 15)  →  Split           [10, 12) + new tail [15, 20)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The planner is pure: it validates bounds and picks the branch. The guard
//! against blocking reservations and the atomic application (shrink + tail
//! insert in one transaction) live in the storage layer, which re-checks
//! inside the transaction using [`overlaps_blocking_reservation`].

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::{PricedPeriod, Reservation};

// =============================================================================
// Block Plan
// =============================================================================

/// The storage mutation a block request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPlan {
    /// The sub-range equals the whole period: delete it.
    Delete,
    /// The sub-range touches the start: move the start forward.
    ShrinkStart { new_start: NaiveDate },
    /// The sub-range touches the end: move the end back.
    ShrinkEnd { new_end: NaiveDate },
    /// Strictly interior: shrink the end to `left_end` and create a new
    /// period `[tail_start, original end)` with the same rate and currency.
    Split {
        left_end: NaiveDate,
        tail_start: NaiveDate,
    },
}

/// Plans the removal of `[block_start, block_end)` from a priced period.
///
/// ## Preconditions
/// * `block_start < block_end`
/// * the sub-range lies fully within `[period.start_date, period.end_date)`
///
/// The caller must additionally verify that no reservation in a blocking
/// status overlaps the removed range before applying the plan.
pub fn plan_block(
    period: &PricedPeriod,
    block_start: NaiveDate,
    block_end: NaiveDate,
) -> Result<BlockPlan, ValidationError> {
    if block_end <= block_start {
        return Err(ValidationError::InvalidDateRange {
            start: block_start,
            end: block_end,
        });
    }

    if block_start < period.start_date || block_end > period.end_date {
        return Err(ValidationError::BlockOutsidePeriod);
    }

    let plan = if block_start == period.start_date && block_end == period.end_date {
        BlockPlan::Delete
    } else if block_start == period.start_date {
        BlockPlan::ShrinkStart {
            new_start: block_end,
        }
    } else if block_end == period.end_date {
        BlockPlan::ShrinkEnd { new_end: block_start }
    } else {
        BlockPlan::Split {
            left_end: block_start,
            tail_start: block_end,
        }
    };

    Ok(plan)
}

/// Whether any reservation in a blocking status (reserved statuses plus
/// `requested`) strictly overlaps `[block_start, block_end)`.
pub fn overlaps_blocking_reservation(
    reservations: &[Reservation],
    block_start: NaiveDate,
    block_end: NaiveDate,
) -> bool {
    reservations.iter().any(|r| {
        r.status.blocks_period_edits()
            && r.start_date < block_end
            && r.end_date > block_start
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReservationStatus;
    use chrono::Utc;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn period(start: u32, end: u32) -> PricedPeriod {
        PricedPeriod {
            id: "p1".into(),
            room_id: "room-1".into(),
            start_date: d(start),
            end_date: d(end),
            nightly_price_cents: 10000,
            currency: "EUR".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn reservation(start: u32, end: u32, status: ReservationStatus) -> Reservation {
        let now = Utc::now();
        Reservation {
            id: "b1".into(),
            room_id: "room-1".into(),
            guest_id: "guest-1".into(),
            start_date: d(start),
            end_date: d(end),
            status,
            total_price_cents: 0,
            currency: "EUR".into(),
            selected_add_ons: vec![],
            approved_at: None,
            payment_deadline: None,
            refunded_at: None,
            status_changed_at: now,
            review_request_sent_at: None,
            checkout_session_id: None,
            payment_intent_id: None,
            refund_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_whole_period_deletes() {
        let plan = plan_block(&period(10, 20), d(10), d(20)).unwrap();
        assert_eq!(plan, BlockPlan::Delete);
    }

    #[test]
    fn test_block_at_start_shrinks_start() {
        let plan = plan_block(&period(10, 20), d(10), d(13)).unwrap();
        assert_eq!(plan, BlockPlan::ShrinkStart { new_start: d(13) });
    }

    #[test]
    fn test_block_at_end_shrinks_end() {
        let plan = plan_block(&period(10, 20), d(17), d(20)).unwrap();
        assert_eq!(plan, BlockPlan::ShrinkEnd { new_end: d(17) });
    }

    #[test]
    fn test_interior_block_splits() {
        let plan = plan_block(&period(10, 20), d(12), d(15)).unwrap();
        assert_eq!(
            plan,
            BlockPlan::Split {
                left_end: d(12),
                tail_start: d(15)
            }
        );
    }

    #[test]
    fn test_inverted_block_rejected() {
        let err = plan_block(&period(10, 20), d(15), d(12)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDateRange { .. }));

        let empty = plan_block(&period(10, 20), d(12), d(12)).unwrap_err();
        assert!(matches!(empty, ValidationError::InvalidDateRange { .. }));
    }

    #[test]
    fn test_block_outside_period_rejected() {
        let err = plan_block(&period(10, 20), d(8), d(12)).unwrap_err();
        assert_eq!(err, ValidationError::BlockOutsidePeriod);

        let err = plan_block(&period(10, 20), d(18), d(22)).unwrap_err();
        assert_eq!(err, ValidationError::BlockOutsidePeriod);
    }

    #[test]
    fn test_requested_reservation_blocks_edit() {
        let existing = [reservation(12, 15, ReservationStatus::Requested)];
        assert!(overlaps_blocking_reservation(&existing, d(12), d(15)));
        assert!(overlaps_blocking_reservation(&existing, d(14), d(18)));
    }

    #[test]
    fn test_terminal_reservation_does_not_block_edit() {
        let existing = [
            reservation(12, 15, ReservationStatus::Canceled),
            reservation(12, 15, ReservationStatus::Declined),
            reservation(12, 15, ReservationStatus::Expired),
            reservation(12, 15, ReservationStatus::Refunded),
        ];
        assert!(!overlaps_blocking_reservation(&existing, d(12), d(15)));
    }

    #[test]
    fn test_touching_reservation_does_not_block_edit() {
        let existing = [reservation(15, 18, ReservationStatus::ConfirmedPaid)];
        assert!(!overlaps_blocking_reservation(&existing, d(12), d(15)));
    }
}
