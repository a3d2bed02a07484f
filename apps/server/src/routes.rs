//! HTTP routes and handlers.
//!
//! Thin marshalling only: parse the request, call the service, map the
//! result. Every decision lives in the lodge-* crates.
//!
//! ## Route Map
//! ```text
//! GET  /health                          liveness + database check
//! POST /rooms                           create a room with its add-on catalog
//! POST /rooms/{id}/periods              create a priced period
//! GET  /rooms/{id}/availability         open date ranges for the calendar
//! POST /rooms/{id}/quote                price a candidate stay
//! POST /rooms/{id}/reservations         guest requests a stay
//! POST /periods/{id}/block              remove dates from a period
//! POST /reservations/{id}/approve       operator approves
//! POST /reservations/{id}/decline       operator declines
//! POST /reservations/{id}/cancel        guest or operator cancels
//! POST /reservations/{id}/checkout      create a hosted checkout session
//! POST /reservations/{id}/refund        refund a paid reservation
//! POST /webhooks/payment                gateway event receiver
//! ```

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use lodge_booking::{BookingError, WebhookOutcome};
use lodge_core::{
    Actor, AddOn, BlockPlan, DateRange, Money, PricedPeriod, Quote, Reservation, Room,
};

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the hex HMAC-SHA256 signature of the webhook body.
const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rooms", post(create_room))
        .route("/rooms/{id}/periods", post(create_period))
        .route("/rooms/{id}/availability", get(availability))
        .route("/rooms/{id}/quote", post(quote))
        .route("/rooms/{id}/reservations", post(request_reservation))
        .route("/periods/{id}/block", post(block_period))
        .route("/reservations/{id}/approve", post(approve))
        .route("/reservations/{id}/decline", post(decline))
        .route("/reservations/{id}/cancel", post(cancel))
        .route("/reservations/{id}/checkout", post(checkout))
        .route("/reservations/{id}/refund", post(refund))
        .route("/webhooks/payment", post(payment_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Request/Response DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
struct CreateRoomRequest {
    owner_id: String,
    name: String,
    capacity: Option<i64>,
    #[serde(default)]
    add_ons: Vec<AddOn>,
}

#[derive(Debug, Deserialize)]
struct CreatePeriodRequest {
    start_date: NaiveDate,
    end_date: NaiveDate,
    nightly_price_cents: i64,
    #[serde(default = "default_currency")]
    currency: String,
}

fn default_currency() -> String {
    lodge_core::DEFAULT_CURRENCY.to_string()
}

#[derive(Debug, Deserialize)]
struct QuoteRequest {
    start_date: NaiveDate,
    end_date: NaiveDate,
    #[serde(default)]
    selected_add_ons: Vec<AddOn>,
}

#[derive(Debug, Deserialize)]
struct ReservationRequest {
    guest_id: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    #[serde(default)]
    selected_add_ons: Vec<AddOn>,
}

#[derive(Debug, Deserialize)]
struct BlockRequest {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

/// Who performs a lifecycle action. Exactly one of the two must be set.
#[derive(Debug, Deserialize)]
struct ActorRequest {
    operator_id: Option<String>,
    guest_id: Option<String>,
}

impl ActorRequest {
    fn into_actor(self) -> Result<Actor, AppError> {
        match (self.operator_id, self.guest_id) {
            (Some(id), None) => Ok(Actor::Operator { id }),
            (None, Some(id)) => Ok(Actor::Guest { id }),
            _ => Err(AppError(BookingError::Validation(
                lodge_core::ValidationError::Required {
                    field: "exactly one of operator_id or guest_id".to_string(),
                },
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefundRequest {
    /// Cents to refund; omit for a full refund.
    amount_cents: Option<i64>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: bool,
}

#[derive(Debug, Serialize)]
struct CancelResponse {
    canceled: bool,
}

#[derive(Debug, Serialize)]
struct CheckoutResponse {
    session_id: String,
    redirect_url: String,
}

#[derive(Debug, Serialize)]
struct BlockResponse {
    applied: &'static str,
}

#[derive(Debug, Serialize)]
struct WebhookResponse {
    outcome: String,
}

// =============================================================================
// Handlers
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        database: state.db.health_check().await,
    })
}

async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<Json<Room>, AppError> {
    let room = state
        .db
        .rooms()
        .create(&req.owner_id, &req.name, req.capacity, &req.add_ons)
        .await?;
    Ok(Json(room))
}

async fn create_period(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(req): Json<CreatePeriodRequest>,
) -> Result<Json<PricedPeriod>, AppError> {
    // 404 for unknown rooms instead of a foreign key failure.
    state.booking_room_exists(&room_id).await?;

    let period = state
        .db
        .periods()
        .create(
            &room_id,
            req.start_date,
            req.end_date,
            req.nightly_price_cents,
            &req.currency,
        )
        .await?;
    Ok(Json(period))
}

async fn availability(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<DateRange>>, AppError> {
    let ranges = state.booking.availability(&room_id).await?;
    Ok(Json(ranges))
}

async fn quote(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<Quote>, AppError> {
    let quote = state
        .booking
        .quote(&room_id, req.start_date, req.end_date, &req.selected_add_ons)
        .await?;
    Ok(Json(quote))
}

async fn request_reservation(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(req): Json<ReservationRequest>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state
        .booking
        .request_reservation(
            &room_id,
            &req.guest_id,
            req.start_date,
            req.end_date,
            req.selected_add_ons,
            Utc::now(),
        )
        .await?;
    Ok(Json(reservation))
}

async fn block_period(
    State(state): State<Arc<AppState>>,
    Path(period_id): Path<String>,
    Json(req): Json<BlockRequest>,
) -> Result<Json<BlockResponse>, AppError> {
    let plan = state
        .db
        .periods()
        .block_range(&period_id, req.start_date, req.end_date)
        .await?;

    let applied = match plan {
        BlockPlan::Delete => "deleted",
        BlockPlan::ShrinkStart { .. } => "shrunk_start",
        BlockPlan::ShrinkEnd { .. } => "shrunk_end",
        BlockPlan::Split { .. } => "split",
    };
    Ok(Json(BlockResponse { applied }))
}

async fn approve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<Reservation>, AppError> {
    let actor = req.into_actor()?;
    let reservation = state.booking.approve(&id, &actor, Utc::now()).await?;
    Ok(Json(reservation))
}

async fn decline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<Reservation>, AppError> {
    let actor = req.into_actor()?;
    let reservation = state.booking.decline(&id, &actor, Utc::now()).await?;
    Ok(Json(reservation))
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ActorRequest>,
) -> Result<Json<CancelResponse>, AppError> {
    let actor = req.into_actor()?;
    let canceled = state.booking.cancel(&id, &actor, Utc::now()).await?;
    Ok(Json(CancelResponse { canceled }))
}

async fn checkout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let session = state.payments.create_checkout(&id, Utc::now()).await?;
    Ok(Json(CheckoutResponse {
        session_id: session.session_id,
        redirect_url: session.redirect_url,
    }))
}

async fn refund(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RefundRequest>,
) -> Result<Json<Reservation>, AppError> {
    let amount = req.amount_cents.map(Money::from_cents);
    let reservation = state.payments.refund(&id, amount, Utc::now()).await?;
    Ok(Json(reservation))
}

/// The gateway event receiver.
///
/// Raw body in, because the signature covers the exact bytes. Recognized
/// and ignored events alike return 2xx so the gateway stops retrying;
/// signature and parse failures return 4xx.
async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, AppError> {
    let Some(secret) = state.config.webhook_secret.as_deref() else {
        return Err(AppError(BookingError::InvalidSignature));
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let outcome = state
        .payments
        .handle_webhook(secret, &body, signature, Utc::now())
        .await?;

    let label = match &outcome {
        WebhookOutcome::Confirmed => "confirmed".to_string(),
        WebhookOutcome::AlreadyConfirmed => "already_confirmed".to_string(),
        WebhookOutcome::DeadlinePassed => "deadline_passed".to_string(),
        WebhookOutcome::NotPayable => "not_payable".to_string(),
        WebhookOutcome::RefundSettled => "refund_settled".to_string(),
        WebhookOutcome::AlreadySettled => "already_settled".to_string(),
        WebhookOutcome::Unmatched => "unmatched".to_string(),
        WebhookOutcome::Ignored { event_type } => format!("ignored:{event_type}"),
    };

    Ok(Json(WebhookResponse { outcome: label }))
}

impl AppState {
    async fn booking_room_exists(&self, room_id: &str) -> Result<(), AppError> {
        if self.db.rooms().get_by_id(room_id).await?.is_none() {
            return Err(AppError(BookingError::RoomNotFound(room_id.to_string())));
        }
        Ok(())
    }
}
