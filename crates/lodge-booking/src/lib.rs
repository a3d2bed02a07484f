//! # lodge-booking: Orchestration Services for Lodge
//!
//! The layer between the pure core and the outside world: the booking
//! write path, the payment gateway boundary, webhook reconciliation and
//! the maintenance sweeps.
//!
//! ## Services
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      lodge-booking Services                             │
//! │                                                                         │
//! │  BookingService   quote / request / approve / decline / cancel         │
//! │  PaymentService   checkout sessions, refunds, webhook reconciliation   │
//! │  SweepService     expiry, stale requests, review requests              │
//! │                                                                         │
//! │  PaymentGateway (trait)      the hosted payment provider client        │
//! │  NotificationSink (trait)    best-effort outbound notifications        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All three services share the same [`lodge_db::Database`] handle; the
//! database serializes their races (see `lodge-db`).

pub mod checkout;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod refund;
pub mod service;
pub mod sweeps;
pub mod webhook;

pub use checkout::PaymentService;
pub use error::{BookingError, BookingResult};
pub use gateway::{
    CheckoutRequest, CheckoutSession, GatewayError, PaymentGateway, PaymentRecord, RefundRecord,
    UnconfiguredGateway,
};
pub use notify::{Notification, NotificationSink, TracingNotifier};
pub use service::BookingService;
pub use sweeps::SweepService;
pub use webhook::{sign, verify_signature, WebhookOutcome};
