//! # Payment Gateway Boundary
//!
//! The trait seam between the booking services and the hosted payment
//! provider. Everything the engine knows about payments flows through this
//! interface: checkout session creation, refund creation, and looking up
//! how much was actually captured for a payment.
//!
//! The engine never handles card data; the guest pays on the provider's
//! hosted page and the provider reports back through webhooks.

use async_trait::async_trait;
use thiserror::Error;

use lodge_core::Money;

// =============================================================================
// Gateway Types
// =============================================================================

/// A hosted checkout session created at the gateway.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Gateway-assigned session identifier (idempotency key for
    /// `checkout.session.completed`).
    pub session_id: String,
    /// Payment intent backing the session, when the gateway assigns one
    /// upfront.
    pub payment_intent_id: Option<String>,
    /// URL the guest is redirected to for payment.
    pub redirect_url: String,
}

/// Parameters for creating a checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Reservation being paid for; echoed back in webhook metadata.
    pub reservation_id: String,
    /// Amount to collect.
    pub amount: Money,
    pub currency: String,
    /// Line description shown on the hosted page.
    pub description: String,
}

/// The gateway's record of a captured payment.
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub payment_intent_id: String,
    /// Amount actually captured. Authoritative for refund bounds; the
    /// locally frozen total is never trusted for this.
    pub captured: Money,
    pub currency: String,
}

/// A refund created at the gateway.
#[derive(Debug, Clone)]
pub struct RefundRecord {
    pub refund_id: String,
    pub amount: Money,
}

// =============================================================================
// Errors
// =============================================================================

/// Payment gateway failures.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway rejected the request.
    #[error("Gateway rejected request: {0}")]
    Rejected(String),

    /// The referenced gateway object does not exist.
    #[error("Gateway object not found: {0}")]
    NotFound(String),

    /// The gateway could not be reached or the client is not configured.
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Trait
// =============================================================================

/// Client interface to the payment provider.
///
/// Object-safe so services can hold `Arc<dyn PaymentGateway>`; tests swap
/// in a mock.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a hosted checkout session for a reservation.
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Looks up the captured amount for a payment intent.
    async fn retrieve_payment(&self, payment_intent_id: &str)
        -> Result<PaymentRecord, GatewayError>;

    /// Creates a refund against a payment intent.
    async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount: Money,
    ) -> Result<RefundRecord, GatewayError>;
}

/// Placeholder gateway for deployments without payment credentials.
///
/// Every call fails with [`GatewayError::Unavailable`]; the rest of the
/// engine (quoting, lifecycle, period editing) works normally.
#[derive(Debug, Default)]
pub struct UnconfiguredGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn create_checkout_session(
        &self,
        _request: &CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        Err(GatewayError::Unavailable(
            "payment gateway is not configured".to_string(),
        ))
    }

    async fn retrieve_payment(
        &self,
        _payment_intent_id: &str,
    ) -> Result<PaymentRecord, GatewayError> {
        Err(GatewayError::Unavailable(
            "payment gateway is not configured".to_string(),
        ))
    }

    async fn create_refund(
        &self,
        _payment_intent_id: &str,
        _amount: Money,
    ) -> Result<RefundRecord, GatewayError> {
        Err(GatewayError::Unavailable(
            "payment gateway is not configured".to_string(),
        ))
    }
}
