//! # Notifications
//!
//! Outbound notifications triggered by lifecycle transitions. Delivery is
//! strictly best-effort: a failed notification never rolls back the
//! transition that triggered it, it is only logged.

use async_trait::async_trait;
use tracing::info;

// =============================================================================
// Notification Events
// =============================================================================

/// A notification to be delivered to a guest or operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Tell the operator a guest requested dates.
    ReservationRequested { reservation_id: String },
    /// Tell the guest the operator approved; payment link follows.
    ReservationApproved { reservation_id: String },
    /// Tell the guest the operator declined.
    ReservationDeclined { reservation_id: String },
    /// Tell the counterpart a reservation was canceled.
    ReservationCanceled { reservation_id: String },
    /// Tell the guest the hold lapsed unpaid.
    ReservationExpired { reservation_id: String },
    /// Tell both sides the payment went through.
    PaymentConfirmed { reservation_id: String },
    /// Tell the guest a refund was issued.
    RefundIssued { reservation_id: String },
    /// Ask the guest for a post-stay review.
    ReviewRequested { reservation_id: String },
}

// =============================================================================
// Sink
// =============================================================================

/// Delivery backend for notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers a notification. Errors are the sink's problem: callers
    /// ignore the result beyond logging.
    async fn deliver(&self, notification: Notification);
}

/// Default sink: structured log lines instead of outbound mail.
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl NotificationSink for TracingNotifier {
    async fn deliver(&self, notification: Notification) {
        info!(?notification, "Notification");
    }
}
