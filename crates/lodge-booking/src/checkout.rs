//! # Checkout Sessions
//!
//! Creating hosted checkout sessions for approved reservations. The guest
//! pays on the provider's page; confirmation arrives later through the
//! webhook, never through this call.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use lodge_core::{Reservation, StateError};
use lodge_db::Database;

use crate::error::BookingResult;
use crate::gateway::{CheckoutRequest, CheckoutSession, PaymentGateway};
use crate::notify::NotificationSink;

/// Orchestrates gateway-facing operations: checkout sessions, refunds and
/// webhook reconciliation.
#[derive(Clone)]
pub struct PaymentService {
    db: Database,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationSink>,
}

impl PaymentService {
    /// Creates a new payment service.
    pub fn new(
        db: Database,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        PaymentService {
            db,
            gateway,
            notifier,
        }
    }

    /// Creates a hosted checkout session for a reservation.
    ///
    /// Only while the payment window is open: the reservation must be
    /// `approved_pending_payment` and `now` before the payment deadline.
    /// The returned references are persisted immediately (write-once) so a
    /// completed-checkout webhook can always find its reservation.
    pub async fn create_checkout(
        &self,
        reservation_id: &str,
        now: DateTime<Utc>,
    ) -> BookingResult<CheckoutSession> {
        let reservation = self.load_reservation(reservation_id).await?;

        if !reservation.payment_window_open(now) {
            return Err(StateError::WrongStatus {
                action: "create a checkout session for",
                current: reservation.status.as_str(),
            }
            .into());
        }

        let request = CheckoutRequest {
            reservation_id: reservation.id.clone(),
            amount: reservation.total_price(),
            currency: reservation.currency.clone(),
            description: format!(
                "Stay {} to {} ({} nights)",
                reservation.start_date,
                reservation.end_date,
                reservation.nights()
            ),
        };

        let session = self.gateway.create_checkout_session(&request).await?;

        self.db
            .reservations()
            .set_checkout_refs(
                &reservation.id,
                &session.session_id,
                session.payment_intent_id.as_deref(),
            )
            .await?;

        info!(
            reservation_id = %reservation.id,
            session_id = %session.session_id,
            "Checkout session created"
        );

        Ok(session)
    }

    // =========================================================================
    // Shared accessors for the refund and webhook modules
    // =========================================================================

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }

    pub(crate) fn gateway(&self) -> &dyn PaymentGateway {
        self.gateway.as_ref()
    }

    pub(crate) async fn notify(&self, notification: crate::notify::Notification) {
        self.notifier.deliver(notification).await;
    }

    pub(crate) async fn load_reservation(
        &self,
        reservation_id: &str,
    ) -> BookingResult<Reservation> {
        self.db
            .reservations()
            .get_by_id(reservation_id)
            .await?
            .ok_or_else(|| crate::error::BookingError::ReservationNotFound(
                reservation_id.to_string(),
            ))
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite + mock gateway)
// =============================================================================
