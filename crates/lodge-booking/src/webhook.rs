//! # Webhook Reconciliation
//!
//! Authenticating and applying payment gateway events.
//!
//! ## Event Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       handle_webhook()                                  │
//! │                                                                         │
//! │  1. Verify HMAC-SHA256 signature over the RAW body                     │
//! │     └── mismatch → InvalidSignature (client error, never 5xx)          │
//! │  2. Parse the event envelope                                           │
//! │     └── malformed → MalformedWebhook (client error)                    │
//! │  3. Dispatch by type:                                                  │
//! │     checkout.session.completed → confirm payment (idempotent)         │
//! │     refund.updated (succeeded) → settle refund state (idempotent)      │
//! │     everything else            → acknowledged, ignored                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The gateway retries until it sees a 2xx, so every reachable outcome of a
//! recognized event must be a success: re-deliveries land on `Already*`
//! outcomes, unknown references are acknowledged and logged.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{info, warn};

use lodge_core::{CheckoutOutcome, ReservationStatus};

use crate::checkout::PaymentService;
use crate::error::{BookingError, BookingResult};
use crate::notify::Notification;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Signature Verification
// =============================================================================

/// Verifies a hex-encoded HMAC-SHA256 signature over the raw request body.
///
/// Comparison is constant-time (`Mac::verify_slice`).
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Computes the hex signature for a body. The counterpart of
/// [`verify_signature`], used by tests and local tooling.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

// =============================================================================
// Event Envelope
// =============================================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: String,
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CheckoutObject {
    id: String,
    payment_intent: Option<String>,
    #[serde(default)]
    metadata: CheckoutMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct CheckoutMetadata {
    reservation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefundObject {
    id: String,
    payment_intent: Option<String>,
    status: Option<String>,
}

/// What handling a webhook did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Payment confirmed; the reservation is now `confirmed_paid`.
    Confirmed,
    /// Re-delivery of a completed checkout; nothing changed.
    AlreadyConfirmed,
    /// The payment arrived after the deadline; references recorded, the
    /// reservation was NOT confirmed.
    DeadlinePassed,
    /// The reservation cannot accept payment (terminal status).
    NotPayable,
    /// Refund state settled from the gateway event.
    RefundSettled,
    /// Refund state was already settled; nothing changed.
    AlreadySettled,
    /// Recognized event type, but no reservation matches its references.
    Unmatched,
    /// Event type this engine does not act on.
    Ignored { event_type: String },
}

// =============================================================================
// Handling
// =============================================================================

impl PaymentService {
    /// Authenticates and applies a webhook delivery.
    ///
    /// Signature and parse failures are client errors; the caller maps them
    /// to 4xx so the gateway stops retrying a request that can never
    /// succeed.
    pub async fn handle_webhook(
        &self,
        secret: &str,
        body: &[u8],
        signature: &str,
        now: DateTime<Utc>,
    ) -> BookingResult<WebhookOutcome> {
        if !verify_signature(secret, body, signature) {
            return Err(BookingError::InvalidSignature);
        }

        let envelope: Envelope = serde_json::from_slice(body)
            .map_err(|e| BookingError::MalformedWebhook(e.to_string()))?;

        match envelope.event_type.as_str() {
            "checkout.session.completed" => {
                let object: CheckoutObject = serde_json::from_value(envelope.data.object)
                    .map_err(|e| BookingError::MalformedWebhook(e.to_string()))?;
                self.apply_checkout_completed(object, now).await
            }
            "refund.updated" => {
                let object: RefundObject = serde_json::from_value(envelope.data.object)
                    .map_err(|e| BookingError::MalformedWebhook(e.to_string()))?;
                self.apply_refund_updated(object, now).await
            }
            other => {
                // Includes checkout.session.expired and
                // checkout.session.async_payment_failed: the expiry sweep
                // owns those outcomes, the events are acknowledged only.
                info!(event_type = %other, "Ignoring webhook event type");
                Ok(WebhookOutcome::Ignored {
                    event_type: other.to_string(),
                })
            }
        }
    }

    /// Applies a completed checkout: locate the reservation by the metadata
    /// reference, falling back to the session id, then confirm if the
    /// payment window still allows it.
    async fn apply_checkout_completed(
        &self,
        object: CheckoutObject,
        now: DateTime<Utc>,
    ) -> BookingResult<WebhookOutcome> {
        let repo = self.db().reservations();

        let mut reservation = match object.metadata.reservation_id.as_deref() {
            Some(id) => repo.get_by_id(id).await?,
            None => None,
        };
        if reservation.is_none() {
            reservation = repo.find_by_checkout_session(&object.id).await?;
        }
        let Some(mut reservation) = reservation else {
            warn!(session_id = %object.id, "Checkout event matches no reservation");
            return Ok(WebhookOutcome::Unmatched);
        };

        let previous = reservation.status;
        let outcome =
            reservation.apply_checkout_completed(&object.id, object.payment_intent.as_deref(), now);

        match outcome {
            CheckoutOutcome::Confirmed => {
                let written = repo.persist_transition(&reservation, previous).await?;
                if !written {
                    // A concurrent delivery confirmed it first.
                    return Ok(WebhookOutcome::AlreadyConfirmed);
                }

                info!(reservation_id = %reservation.id, "Payment confirmed");
                self.notify(Notification::PaymentConfirmed {
                    reservation_id: reservation.id.clone(),
                })
                .await;
                Ok(WebhookOutcome::Confirmed)
            }
            CheckoutOutcome::AlreadyConfirmed => {
                self.backfill_refs(&reservation.id, &object).await?;
                Ok(WebhookOutcome::AlreadyConfirmed)
            }
            CheckoutOutcome::DeadlinePassed => {
                // Keep the references for out-of-band reconciliation; the
                // booking stays unconfirmed and the sweep will expire it.
                self.backfill_refs(&reservation.id, &object).await?;
                warn!(
                    reservation_id = %reservation.id,
                    session_id = %object.id,
                    "Payment completed after the deadline; not confirming"
                );
                Ok(WebhookOutcome::DeadlinePassed)
            }
            CheckoutOutcome::NotPayable => {
                warn!(
                    reservation_id = %reservation.id,
                    status = reservation.status.as_str(),
                    "Checkout completed for a non-payable reservation"
                );
                Ok(WebhookOutcome::NotPayable)
            }
        }
    }

    async fn backfill_refs(&self, reservation_id: &str, object: &CheckoutObject) -> BookingResult<()> {
        self.db()
            .reservations()
            .set_checkout_refs(reservation_id, &object.id, object.payment_intent.as_deref())
            .await?;
        Ok(())
    }

    /// Applies a refund update: locate by refund id, falling back to the
    /// payment intent, and settle local state idempotently.
    ///
    /// This also covers refunds initiated at the gateway's own dashboard,
    /// where no local refund call ever ran.
    async fn apply_refund_updated(
        &self,
        object: RefundObject,
        now: DateTime<Utc>,
    ) -> BookingResult<WebhookOutcome> {
        if object.status.as_deref() != Some("succeeded") {
            return Ok(WebhookOutcome::Ignored {
                event_type: "refund.updated (not succeeded)".to_string(),
            });
        }

        let repo = self.db().reservations();

        let mut reservation = repo.find_by_refund_id(&object.id).await?;
        if reservation.is_none() {
            if let Some(intent) = object.payment_intent.as_deref() {
                reservation = repo.find_by_payment_intent(intent).await?;
            }
        }
        let Some(mut reservation) = reservation else {
            warn!(refund_id = %object.id, "Refund event matches no reservation");
            return Ok(WebhookOutcome::Unmatched);
        };

        let previous = reservation.status;
        let mut changed = reservation.apply_refund_updated(now);
        if reservation.refund_id.is_none() {
            reservation.refund_id = Some(object.id.clone());
            changed = true;
        }

        if !changed {
            return Ok(WebhookOutcome::AlreadySettled);
        }

        let written = repo.persist_transition(&reservation, previous).await?;
        if !written {
            return Ok(WebhookOutcome::AlreadySettled);
        }

        info!(
            reservation_id = %reservation.id,
            refund_id = %object.id,
            "Refund settled from webhook"
        );
        if previous != ReservationStatus::Refunded {
            self.notify(Notification::RefundIssued {
                reservation_id: reservation.id.clone(),
            })
            .await;
        }
        Ok(WebhookOutcome::RefundSettled)
    }
}

// =============================================================================
// Tests
// =============================================================================
