//! # Reservation Lifecycle
//!
//! The reservation state machine: one transition table, consulted by every
//! operation, instead of per-operation "allowed previous states" lists.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Reservation Lifecycle                               │
//! │                                                                         │
//! │              Approve              ConfirmPayment         Refund         │
//! │  requested ─────────► approved_ ──────────────► confirmed ──────►      │
//! │      │                pending_payment               _paid     refunded  │
//! │      │ Decline            │                                             │
//! │      ├────► declined      │ Cancel                                      │
//! │      │ Cancel             ├────► canceled                               │
//! │      └────► canceled      │ Expire (deadline passed)                    │
//! │                           └────► expired                                │
//! │                                                                         │
//! │  declined / canceled / expired / refunded are terminal.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation takes `now` explicitly so that time-driven guards
//! (payment deadline, expiry) are deterministic and testable. Persistence is
//! a separate concern: these methods mutate the aggregate in memory, and the
//! storage layer re-enforces the same guards with conditional updates.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::error::{CoreResult, StateError};
use crate::money::Money;
use crate::quote::Quote;
use crate::types::{Actor, AddOn, Reservation, ReservationStatus};
use crate::PAYMENT_WINDOW_HOURS;

// =============================================================================
// Events & Transition Table
// =============================================================================

/// Lifecycle events that drive status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationEvent {
    Approve,
    Decline,
    Cancel,
    Expire,
    ConfirmPayment,
    Refund,
}

impl ReservationEvent {
    fn action(&self) -> &'static str {
        match self {
            ReservationEvent::Approve => "approve",
            ReservationEvent::Decline => "decline",
            ReservationEvent::Cancel => "cancel",
            ReservationEvent::Expire => "expire",
            ReservationEvent::ConfirmPayment => "confirm payment for",
            ReservationEvent::Refund => "refund",
        }
    }
}

/// The single transition table: `state × event → state | rejected`.
///
/// Notably absent: `confirmed_paid × Cancel`. A paid reservation is immutable
/// from direct cancellation and must go through refund.
pub fn transition(
    status: ReservationStatus,
    event: ReservationEvent,
) -> Result<ReservationStatus, StateError> {
    use ReservationEvent as E;
    use ReservationStatus as S;

    match (status, event) {
        (S::Requested, E::Approve) => Ok(S::ApprovedPendingPayment),
        (S::Requested, E::Decline) => Ok(S::Declined),
        (S::Requested, E::Cancel) => Ok(S::Canceled),
        (S::ApprovedPendingPayment, E::Cancel) => Ok(S::Canceled),
        (S::ApprovedPendingPayment, E::Expire) => Ok(S::Expired),
        (S::ApprovedPendingPayment, E::ConfirmPayment) => Ok(S::ConfirmedPaid),
        (S::ConfirmedPaid, E::Refund) => Ok(S::Refunded),
        (current, event) => Err(StateError::WrongStatus {
            action: event.action(),
            current: current.as_str(),
        }),
    }
}

// =============================================================================
// Reconciliation Outcomes
// =============================================================================

/// What a checkout-completed gateway event did to the reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Transitioned to `confirmed_paid`.
    Confirmed,
    /// Already confirmed earlier; re-delivery absorbed as a no-op.
    AlreadyConfirmed,
    /// The payment deadline had passed; a late success must NOT confirm.
    DeadlinePassed,
    /// The reservation is in a status that cannot accept payment.
    NotPayable,
}

// =============================================================================
// Lifecycle Operations
// =============================================================================

impl Reservation {
    /// Creates a new reservation in `requested` status from an accepted
    /// quote. Pricing is frozen here and never recomputed.
    #[allow(clippy::too_many_arguments)]
    pub fn request(
        id: String,
        room_id: String,
        guest_id: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        selected_add_ons: Vec<AddOn>,
        quote: &Quote,
        now: DateTime<Utc>,
    ) -> Reservation {
        Reservation {
            id,
            room_id,
            guest_id,
            start_date,
            end_date,
            status: ReservationStatus::Requested,
            total_price_cents: quote.total.cents(),
            currency: quote.currency.clone(),
            selected_add_ons,
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

    fn set_status(&mut self, status: ReservationStatus, now: DateTime<Utc>) {
        self.status = status;
        self.status_changed_at = now;
        self.updated_at = now;
    }

    /// Operator approves the request: opens a 48h payment window.
    ///
    /// Only from `requested`; only by the operator.
    pub fn approve(&mut self, by: &Actor, now: DateTime<Utc>) -> CoreResult<()> {
        if !by.is_operator() {
            return Err(StateError::WrongActor { action: "approve" }.into());
        }

        let next = transition(self.status, ReservationEvent::Approve)?;
        self.approved_at = Some(now);
        self.payment_deadline = Some(now + Duration::hours(PAYMENT_WINDOW_HOURS));
        self.set_status(next, now);
        Ok(())
    }

    /// Operator declines the request. Only from `requested`.
    pub fn decline(&mut self, by: &Actor, now: DateTime<Utc>) -> CoreResult<()> {
        if !by.is_operator() {
            return Err(StateError::WrongActor { action: "decline" }.into());
        }

        let next = transition(self.status, ReservationEvent::Decline)?;
        self.set_status(next, now);
        Ok(())
    }

    /// Cancels the reservation, if its status allows it.
    ///
    /// Returns `false` (a no-op, not an error) when the current status
    /// disallows cancellation — notably `confirmed_paid`, which must go
    /// through refund.
    pub fn cancel(&mut self, _by: &Actor, now: DateTime<Utc>) -> bool {
        match transition(self.status, ReservationEvent::Cancel) {
            Ok(next) => {
                self.set_status(next, now);
                true
            }
            Err(_) => false,
        }
    }

    /// Expires an approved reservation whose payment deadline has passed.
    ///
    /// Idempotent: safe to call repeatedly; returns `true` only on the call
    /// that actually transitions.
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != ReservationStatus::ApprovedPendingPayment {
            return false;
        }
        let Some(deadline) = self.payment_deadline else {
            return false;
        };
        if now < deadline {
            return false;
        }

        // Guard above ensures the transition is legal.
        if let Ok(next) = transition(self.status, ReservationEvent::Expire) {
            self.set_status(next, now);
            return true;
        }
        false
    }

    /// Reconciles a gateway checkout-completed event.
    ///
    /// Backfills the session/payment-intent references if absent, then
    /// confirms only while `approved_pending_payment` and before the
    /// payment deadline. A late-arriving success after expiry must NOT
    /// confirm the booking; the money is reconciled out-of-band.
    ///
    /// Idempotent by status check: re-delivery after confirmation is a safe
    /// no-op.
    pub fn apply_checkout_completed(
        &mut self,
        session_id: &str,
        payment_intent_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> CheckoutOutcome {
        if self.checkout_session_id.is_none() {
            self.checkout_session_id = Some(session_id.to_string());
            self.updated_at = now;
        }
        if let Some(intent) = payment_intent_id {
            if self.payment_intent_id.is_none() {
                self.payment_intent_id = Some(intent.to_string());
                self.updated_at = now;
            }
        }

        match self.status {
            ReservationStatus::ConfirmedPaid => CheckoutOutcome::AlreadyConfirmed,
            ReservationStatus::ApprovedPendingPayment => {
                let window_open = self.payment_deadline.map(|d| now < d).unwrap_or(false);
                if !window_open {
                    return CheckoutOutcome::DeadlinePassed;
                }
                match transition(self.status, ReservationEvent::ConfirmPayment) {
                    Ok(next) => {
                        self.set_status(next, now);
                        CheckoutOutcome::Confirmed
                    }
                    Err(_) => CheckoutOutcome::NotPayable,
                }
            }
            _ => CheckoutOutcome::NotPayable,
        }
    }

    /// Validates a refund request before any gateway call is made.
    ///
    /// ## Arguments
    /// * `requested` - optional partial amount; `None` refunds the total
    /// * `captured` - the amount actually captured at the gateway, fetched
    ///   from the gateway's payment record (never trusted from the caller)
    ///
    /// ## Returns
    /// The amount to refund.
    pub fn validate_refund(
        &self,
        requested: Option<Money>,
        captured: Money,
    ) -> Result<Money, StateError> {
        if self.status != ReservationStatus::ConfirmedPaid {
            return Err(StateError::WrongStatus {
                action: "refund",
                current: self.status.as_str(),
            });
        }
        if self.payment_intent_id.is_none() {
            return Err(StateError::PaymentReferenceMissing);
        }
        // Presence of a refund id, not only the status, resists
        // double-submission races.
        if self.refund_id.is_some() {
            return Err(StateError::AlreadyRefunded);
        }

        let amount = requested.unwrap_or_else(|| self.total_price());
        if !amount.is_positive() {
            return Err(StateError::RefundAmountInvalid);
        }
        if amount > self.total_price() {
            return Err(StateError::RefundExceedsTotal {
                requested: amount.cents(),
                total: self.total_price_cents,
            });
        }
        if amount > captured {
            return Err(StateError::RefundExceedsCaptured {
                requested: amount.cents(),
                captured: captured.cents(),
            });
        }

        Ok(amount)
    }

    /// Records a successful refund: status → `refunded`, reference and
    /// timestamp stored.
    pub fn mark_refunded(&mut self, refund_id: String, now: DateTime<Utc>) -> CoreResult<()> {
        if self.refund_id.is_some() {
            return Err(StateError::AlreadyRefunded.into());
        }

        let next = transition(self.status, ReservationEvent::Refund)?;
        self.refund_id = Some(refund_id);
        self.refunded_at = Some(now);
        self.set_status(next, now);
        Ok(())
    }

    /// Reconciles a gateway refund-updated event, idempotently.
    ///
    /// Returns `true` if anything changed.
    pub fn apply_refund_updated(&mut self, now: DateTime<Utc>) -> bool {
        let mut changed = false;

        if self.status != ReservationStatus::Refunded {
            self.set_status(ReservationStatus::Refunded, now);
            changed = true;
        }
        if self.refunded_at.is_none() {
            self.refunded_at = Some(now);
            self.updated_at = now;
            changed = true;
        }

        changed
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::quote_stay;
    use crate::types::PricedPeriod;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn operator() -> Actor {
        Actor::Operator {
            id: "owner-1".into(),
        }
    }

    fn guest() -> Actor {
        Actor::Guest {
            id: "guest-1".into(),
        }
    }

    fn requested_reservation() -> Reservation {
        let period = PricedPeriod {
            id: "p1".into(),
            room_id: "room-1".into(),
            start_date: d(10),
            end_date: d(20),
            nightly_price_cents: 10000,
            currency: "EUR".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let quote = quote_stay(&[period], &[], d(12), d(15), Money::zero()).unwrap();
        Reservation::request(
            "res-1".into(),
            "room-1".into(),
            "guest-1".into(),
            d(12),
            d(15),
            vec![],
            &quote,
            Utc::now(),
        )
    }

    #[test]
    fn test_request_freezes_pricing() {
        let r = requested_reservation();
        assert_eq!(r.status, ReservationStatus::Requested);
        assert_eq!(r.total_price_cents, 30000);
        assert_eq!(r.currency, "EUR");
        assert_eq!(r.nights(), 3);
    }

    #[test]
    fn test_approve_sets_deadline_48h_out() {
        let mut r = requested_reservation();
        let now = Utc::now();

        r.approve(&operator(), now).unwrap();

        assert_eq!(r.status, ReservationStatus::ApprovedPendingPayment);
        assert_eq!(r.approved_at, Some(now));
        assert_eq!(r.payment_deadline, Some(now + Duration::hours(48)));
        assert!(r.payment_window_open(now + Duration::hours(47)));
        assert!(!r.payment_window_open(now + Duration::hours(49)));
    }

    #[test]
    fn test_approve_twice_rejected() {
        let mut r = requested_reservation();
        let now = Utc::now();

        r.approve(&operator(), now).unwrap();
        let err = r.approve(&operator(), now).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::State(StateError::WrongStatus { .. })
        ));
    }

    #[test]
    fn test_approve_requires_operator() {
        let mut r = requested_reservation();
        let err = r.approve(&guest(), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CoreError::State(StateError::WrongActor { .. })
        ));
        assert_eq!(r.status, ReservationStatus::Requested);
    }

    #[test]
    fn test_decline_only_from_requested() {
        let mut r = requested_reservation();
        let now = Utc::now();
        r.decline(&operator(), now).unwrap();
        assert_eq!(r.status, ReservationStatus::Declined);

        let mut r2 = requested_reservation();
        r2.approve(&operator(), now).unwrap();
        assert!(r2.decline(&operator(), now).is_err());
    }

    #[test]
    fn test_cancel_noop_semantics() {
        let now = Utc::now();

        let mut r = requested_reservation();
        assert!(r.cancel(&guest(), now));
        assert_eq!(r.status, ReservationStatus::Canceled);

        // Canceling again: no-op, not an error.
        assert!(!r.cancel(&guest(), now));

        // Paid reservations cannot be canceled directly.
        let mut paid = requested_reservation();
        paid.approve(&operator(), now).unwrap();
        paid.apply_checkout_completed("cs_1", Some("pi_1"), now + Duration::hours(1));
        assert_eq!(paid.status, ReservationStatus::ConfirmedPaid);
        assert!(!paid.cancel(&operator(), now));
        assert_eq!(paid.status, ReservationStatus::ConfirmedPaid);
    }

    #[test]
    fn test_expire_if_due_is_idempotent() {
        let mut r = requested_reservation();
        let now = Utc::now();
        r.approve(&operator(), now).unwrap();

        // Before the deadline: no-op.
        assert!(!r.expire_if_due(now + Duration::hours(47)));
        assert_eq!(r.status, ReservationStatus::ApprovedPendingPayment);

        // After the deadline: transitions exactly once.
        let late = now + Duration::hours(49);
        assert!(r.expire_if_due(late));
        assert_eq!(r.status, ReservationStatus::Expired);
        assert!(!r.expire_if_due(late));
    }

    #[test]
    fn test_checkout_completed_confirms_within_window() {
        let mut r = requested_reservation();
        let now = Utc::now();
        r.approve(&operator(), now).unwrap();

        let outcome = r.apply_checkout_completed("cs_1", Some("pi_1"), now + Duration::hours(1));
        assert_eq!(outcome, CheckoutOutcome::Confirmed);
        assert_eq!(r.status, ReservationStatus::ConfirmedPaid);
        assert_eq!(r.checkout_session_id.as_deref(), Some("cs_1"));
        assert_eq!(r.payment_intent_id.as_deref(), Some("pi_1"));
    }

    #[test]
    fn test_late_checkout_completed_does_not_confirm() {
        let mut r = requested_reservation();
        let now = Utc::now();
        r.approve(&operator(), now).unwrap();

        let outcome = r.apply_checkout_completed("cs_1", Some("pi_1"), now + Duration::hours(49));
        assert_eq!(outcome, CheckoutOutcome::DeadlinePassed);
        assert_eq!(r.status, ReservationStatus::ApprovedPendingPayment);
        // References are still backfilled for reconciliation.
        assert_eq!(r.checkout_session_id.as_deref(), Some("cs_1"));
    }

    #[test]
    fn test_checkout_completed_redelivery_is_noop() {
        let mut r = requested_reservation();
        let now = Utc::now();
        r.approve(&operator(), now).unwrap();
        r.apply_checkout_completed("cs_1", Some("pi_1"), now + Duration::hours(1));

        let outcome = r.apply_checkout_completed("cs_1", Some("pi_1"), now + Duration::hours(2));
        assert_eq!(outcome, CheckoutOutcome::AlreadyConfirmed);
        assert_eq!(r.status, ReservationStatus::ConfirmedPaid);
    }

    #[test]
    fn test_checkout_completed_does_not_overwrite_references() {
        let mut r = requested_reservation();
        let now = Utc::now();
        r.approve(&operator(), now).unwrap();
        r.apply_checkout_completed("cs_1", Some("pi_1"), now + Duration::hours(1));

        r.apply_checkout_completed("cs_other", Some("pi_other"), now + Duration::hours(2));
        assert_eq!(r.checkout_session_id.as_deref(), Some("cs_1"));
        assert_eq!(r.payment_intent_id.as_deref(), Some("pi_1"));
    }

    fn paid_reservation() -> (Reservation, DateTime<Utc>) {
        let mut r = requested_reservation();
        let now = Utc::now();
        r.approve(&operator(), now).unwrap();
        r.apply_checkout_completed("cs_1", Some("pi_1"), now + Duration::hours(1));
        (r, now + Duration::hours(2))
    }

    #[test]
    fn test_validate_refund_full_amount() {
        let (r, _) = paid_reservation();
        let amount = r.validate_refund(None, Money::from_cents(30000)).unwrap();
        assert_eq!(amount, Money::from_cents(30000));
    }

    #[test]
    fn test_refund_exceeding_total_rejected() {
        let (r, _) = paid_reservation();
        let err = r
            .validate_refund(Some(Money::from_cents(40000)), Money::from_cents(40000))
            .unwrap_err();
        assert!(matches!(err, StateError::RefundExceedsTotal { .. }));
    }

    #[test]
    fn test_refund_exceeding_captured_rejected() {
        let (r, _) = paid_reservation();
        // Only part of the total was actually captured at the gateway.
        let err = r
            .validate_refund(Some(Money::from_cents(30000)), Money::from_cents(20000))
            .unwrap_err();
        assert!(matches!(err, StateError::RefundExceedsCaptured { .. }));
    }

    #[test]
    fn test_refund_requires_payment_reference() {
        let (mut r, _) = paid_reservation();
        r.payment_intent_id = None;
        let err = r.validate_refund(None, Money::from_cents(30000)).unwrap_err();
        assert_eq!(err, StateError::PaymentReferenceMissing);
    }

    #[test]
    fn test_refund_not_issued_twice() {
        let (mut r, now) = paid_reservation();
        r.mark_refunded("re_1".into(), now).unwrap();
        assert_eq!(r.status, ReservationStatus::Refunded);
        assert!(r.refunded_at.is_some());

        // Second attempt fails the status precondition first.
        let err = r.validate_refund(None, Money::from_cents(30000)).unwrap_err();
        assert_eq!(
            err,
            StateError::WrongStatus {
                action: "refund",
                current: "refunded",
            }
        );
        assert!(r.mark_refunded("re_2".into(), now).is_err());
        assert_eq!(r.refund_id.as_deref(), Some("re_1"));
    }

    #[test]
    fn test_refund_id_blocks_double_submission() {
        // A gateway refund recorded while the status write is still in
        // flight: the refund id alone must reject a second submission.
        let (mut r, _) = paid_reservation();
        r.refund_id = Some("re_1".into());

        let err = r.validate_refund(None, Money::from_cents(30000)).unwrap_err();
        assert_eq!(err, StateError::AlreadyRefunded);
    }

    #[test]
    fn test_refund_only_from_confirmed_paid() {
        let mut r = requested_reservation();
        let err = r.validate_refund(None, Money::from_cents(30000)).unwrap_err();
        assert!(matches!(err, StateError::WrongStatus { .. }));
        assert!(r.mark_refunded("re_1".into(), Utc::now()).is_err());
    }

    #[test]
    fn test_refund_updated_webhook_is_idempotent() {
        let (mut r, now) = paid_reservation();
        r.mark_refunded("re_1".into(), now).unwrap();

        // Re-delivery after the state is already settled changes nothing.
        assert!(!r.apply_refund_updated(now + Duration::hours(1)));
        assert_eq!(r.status, ReservationStatus::Refunded);
    }

    #[test]
    fn test_refund_updated_settles_unreconciled_state() {
        let (mut r, now) = paid_reservation();
        r.refund_id = Some("re_1".into()); // reference recorded, status not yet

        assert!(r.apply_refund_updated(now));
        assert_eq!(r.status, ReservationStatus::Refunded);
        assert!(r.refunded_at.is_some());
    }

    #[test]
    fn test_transition_table_rejects_illegal_moves() {
        use ReservationEvent as E;
        use ReservationStatus as S;

        assert!(transition(S::Declined, E::Approve).is_err());
        assert!(transition(S::Expired, E::ConfirmPayment).is_err());
        assert!(transition(S::ConfirmedPaid, E::Cancel).is_err());
        assert!(transition(S::Requested, E::Refund).is_err());
        assert!(transition(S::Refunded, E::Refund).is_err());
    }
}
