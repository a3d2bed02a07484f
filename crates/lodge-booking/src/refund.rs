//! # Refunds
//!
//! Creating refunds for paid reservations.
//!
//! ## Refund Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          refund()                                       │
//! │                                                                         │
//! │  1. Load reservation; must be confirmed_paid with a payment intent     │
//! │     and no refund reference yet                                        │
//! │  2. Fetch the CAPTURED amount from the gateway (never trusted from     │
//! │     the caller or the local total)                                     │
//! │  3. Validate the amount: positive, ≤ frozen total, ≤ captured          │
//! │  4. Create the refund at the gateway                                   │
//! │  5. Persist: status → refunded, refund_id + refunded_at (CAS on        │
//! │     confirmed_paid)                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Step 5 losing the CAS means a webhook settled the row first; the gateway
//! refund already exists either way, so the outcome is reported as success.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use lodge_core::{Money, Reservation, ReservationStatus, StateError};

use crate::checkout::PaymentService;
use crate::error::BookingResult;
use crate::notify::Notification;

impl PaymentService {
    /// Refunds a paid reservation, fully (`amount: None`) or partially.
    pub async fn refund(
        &self,
        reservation_id: &str,
        amount: Option<Money>,
        now: DateTime<Utc>,
    ) -> BookingResult<Reservation> {
        let mut reservation = self.load_reservation(reservation_id).await?;

        // Cheap status/reference screen before any gateway traffic; the
        // full validation runs again once the captured amount is known.
        if reservation.status != ReservationStatus::ConfirmedPaid {
            return Err(StateError::WrongStatus {
                action: "refund",
                current: reservation.status.as_str(),
            }
            .into());
        }
        let Some(payment_intent_id) = reservation.payment_intent_id.clone() else {
            return Err(StateError::PaymentReferenceMissing.into());
        };

        let payment = self.gateway().retrieve_payment(&payment_intent_id).await?;
        let refund_amount = reservation.validate_refund(amount, payment.captured)?;

        let refund = self
            .gateway()
            .create_refund(&payment_intent_id, refund_amount)
            .await?;

        reservation.mark_refunded(refund.refund_id.clone(), now)?;
        let written = self
            .db()
            .reservations()
            .persist_transition(&reservation, ReservationStatus::ConfirmedPaid)
            .await?;

        if !written {
            // A refund webhook raced us and settled the row; the gateway
            // refund exists, nothing to undo.
            warn!(
                reservation_id = %reservation.id,
                refund_id = %refund.refund_id,
                "Refund persisted by a concurrent writer"
            );
        }

        info!(
            reservation_id = %reservation.id,
            refund_id = %refund.refund_id,
            amount_cents = refund_amount.cents(),
            "Refund created"
        );

        self.notify(Notification::RefundIssued {
            reservation_id: reservation.id.clone(),
        })
        .await;

        Ok(reservation)
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite + mock gateway)
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::checkout::tests::{approve, seeded_service};
    use crate::error::BookingError;
    use chrono::{Duration, Utc};
    use lodge_core::{Money, ReservationStatus, StateError};

    async fn pay(service: &crate::checkout::PaymentService, id: &str) {
        let now = Utc::now();
        approve(service, id, now).await;
        service.create_checkout(id, now).await.unwrap();

        let mut reservation = service.load_reservation(id).await.unwrap();
        let session_id = reservation.checkout_session_id.clone().unwrap();
        reservation.apply_checkout_completed(&session_id, None, now + Duration::hours(1));
        service
            .db()
            .reservations()
            .persist_transition(&reservation, ReservationStatus::ApprovedPendingPayment)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_full_refund() {
        let (service, gateway, id) = seeded_service().await;
        pay(&service, &id).await;

        let refunded = service.refund(&id, None, Utc::now()).await.unwrap();
        assert_eq!(refunded.status, ReservationStatus::Refunded);
        assert!(refunded.refund_id.is_some());
        assert!(refunded.refunded_at.is_some());

        let calls = gateway.refunds.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, Money::from_cents(30000));
    }

    #[tokio::test]
    async fn test_partial_refund_bounded_by_captured() {
        let (service, gateway, id) = seeded_service().await;
        pay(&service, &id).await;

        // The gateway only captured part of the total.
        *gateway.captured.lock().unwrap() = Some(Money::from_cents(20000));

        let err = service
            .refund(&id, Some(Money::from_cents(25000)), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::State(StateError::RefundExceedsCaptured { .. })
        ));

        // Within the captured amount it goes through.
        service
            .refund(&id, Some(Money::from_cents(20000)), Utc::now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_refund_twice_rejected() {
        let (service, gateway, id) = seeded_service().await;
        pay(&service, &id).await;

        service.refund(&id, None, Utc::now()).await.unwrap();
        let err = service.refund(&id, None, Utc::now()).await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::State(StateError::WrongStatus { .. })
        ));

        assert_eq!(gateway.refunds.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refund_unpaid_reservation_rejected() {
        let (service, gateway, id) = seeded_service().await;

        let err = service.refund(&id, None, Utc::now()).await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::State(StateError::WrongStatus { .. })
        ));
        assert!(gateway.refunds.lock().unwrap().is_empty());
    }
}
