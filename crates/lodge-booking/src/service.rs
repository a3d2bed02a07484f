//! # Booking Service
//!
//! The reservation write path: quoting, requesting, and the operator and
//! guest lifecycle decisions.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     request_reservation()                               │
//! │                                                                         │
//! │  1. Load room; validate the add-on selection against the catalog       │
//! │  2. Load overlapping priced periods + reserved reservations            │
//! │  3. quote_stay() - full coverage, single currency, no reserved overlap │
//! │  4. Freeze pricing into a `requested` reservation                      │
//! │  5. Guarded INSERT (the storage layer re-checks the overlap)           │
//! │  6. Notify the operator (best-effort)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Decisions live in `lodge-core`; persistence guards live in `lodge-db`;
//! this module only sequences them.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use lodge_core::{
    quote_stay, validate_selected_add_ons, Actor, AddOn, DateRange, DateRangeSet, Quote,
    Reservation, ReservationStatus, Room,
};
use lodge_db::Database;

use crate::error::{BookingError, BookingResult};
use crate::notify::{Notification, NotificationSink};

/// Orchestrates the reservation write path.
#[derive(Clone)]
pub struct BookingService {
    db: Database,
    notifier: Arc<dyn NotificationSink>,
}

impl BookingService {
    /// Creates a new booking service.
    pub fn new(db: Database, notifier: Arc<dyn NotificationSink>) -> Self {
        BookingService { db, notifier }
    }

    /// Prices a candidate stay without creating anything.
    ///
    /// The returned quote is what a booking request freezes; callers show
    /// it to the guest first.
    pub async fn quote(
        &self,
        room_id: &str,
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
        selected_add_ons: &[AddOn],
    ) -> BookingResult<Quote> {
        let room = self.load_room(room_id).await?;
        let add_on_total = validate_selected_add_ons(&room.add_ons, selected_add_ons)?;

        let periods = self
            .db
            .periods()
            .overlapping(room_id, start_date, end_date)
            .await?;
        let reserved = self
            .db
            .reservations()
            .reserved_overlapping(room_id, start_date, end_date)
            .await?;

        let quote = quote_stay(&periods, &reserved, start_date, end_date, add_on_total)?;
        Ok(quote)
    }

    /// Lists the open date ranges of a room for calendar display: the
    /// priced periods minus the nights held by reserved reservations.
    ///
    /// Exported in inclusive `{from, to}` form. A checkout day is free: a
    /// stay ending on the 13th leaves the 13th bookable.
    pub async fn availability(&self, room_id: &str) -> BookingResult<Vec<DateRange>> {
        self.load_room(room_id).await?;

        let periods = self.db.periods().list_for_room(room_id).await?;
        let reservations = self.db.reservations().list_for_room(room_id).await?;

        let open = DateRangeSet::from_intervals(periods.iter().map(|p| p.interval()));
        let held = DateRangeSet::from_intervals(
            reservations
                .iter()
                .filter(|r| r.status.is_reserved())
                .map(|r| r.interval()),
        );

        Ok(open.subtract(&held).to_range_list())
    }

    /// Creates a reservation request for a guest.
    ///
    /// The quote is computed and frozen here; later rate changes never
    /// touch an existing reservation. Competing `requested` rows for the
    /// same dates are allowed.
    pub async fn request_reservation(
        &self,
        room_id: &str,
        guest_id: &str,
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
        selected_add_ons: Vec<AddOn>,
        now: DateTime<Utc>,
    ) -> BookingResult<Reservation> {
        let quote = self
            .quote(room_id, start_date, end_date, &selected_add_ons)
            .await?;

        let reservation = Reservation::request(
            Uuid::new_v4().to_string(),
            room_id.to_string(),
            guest_id.to_string(),
            start_date,
            end_date,
            selected_add_ons,
            &quote,
            now,
        );

        self.db.reservations().create(&reservation).await?;

        info!(
            reservation_id = %reservation.id,
            room_id = %room_id,
            total_cents = reservation.total_price_cents,
            "Reservation requested"
        );

        self.notify(Notification::ReservationRequested {
            reservation_id: reservation.id.clone(),
        })
        .await;

        Ok(reservation)
    }

    /// Operator approves a request, opening the payment window.
    ///
    /// The storage write carries both guards: the row must still be
    /// `requested` and no reserved reservation may overlap. Of two
    /// overlapping requests, only the first approval sticks.
    pub async fn approve(
        &self,
        reservation_id: &str,
        by: &Actor,
        now: DateTime<Utc>,
    ) -> BookingResult<Reservation> {
        let mut reservation = self.load_reservation(reservation_id).await?;

        reservation.approve(by, now)?;
        self.db.reservations().approve(&reservation).await?;

        info!(reservation_id = %reservation.id, "Reservation approved");
        self.notify(Notification::ReservationApproved {
            reservation_id: reservation.id.clone(),
        })
        .await;

        Ok(reservation)
    }

    /// Operator declines a request.
    pub async fn decline(
        &self,
        reservation_id: &str,
        by: &Actor,
        now: DateTime<Utc>,
    ) -> BookingResult<Reservation> {
        let mut reservation = self.load_reservation(reservation_id).await?;

        reservation.decline(by, now)?;
        self.db
            .reservations()
            .persist_transition(&reservation, ReservationStatus::Requested)
            .await?;

        info!(reservation_id = %reservation.id, "Reservation declined");
        self.notify(Notification::ReservationDeclined {
            reservation_id: reservation.id.clone(),
        })
        .await;

        Ok(reservation)
    }

    /// Cancels a reservation.
    ///
    /// No-op semantics: returns `false` when the status disallows it
    /// (notably `confirmed_paid`, which must go through refund) instead of
    /// erroring. Cancel is open to both the guest and the operator.
    pub async fn cancel(
        &self,
        reservation_id: &str,
        by: &Actor,
        now: DateTime<Utc>,
    ) -> BookingResult<bool> {
        let mut reservation = self.load_reservation(reservation_id).await?;
        let previous = reservation.status;

        if !reservation.cancel(by, now) {
            return Ok(false);
        }

        let written = self
            .db
            .reservations()
            .persist_transition(&reservation, previous)
            .await?;

        if written {
            info!(reservation_id = %reservation.id, "Reservation canceled");
            self.notify(Notification::ReservationCanceled {
                reservation_id: reservation.id.clone(),
            })
            .await;
        }

        Ok(written)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    pub(crate) async fn load_room(&self, room_id: &str) -> BookingResult<Room> {
        self.db
            .rooms()
            .get_by_id(room_id)
            .await?
            .ok_or_else(|| BookingError::RoomNotFound(room_id.to_string()))
    }

    pub(crate) async fn load_reservation(
        &self,
        reservation_id: &str,
    ) -> BookingResult<Reservation> {
        self.db
            .reservations()
            .get_by_id(reservation_id)
            .await?
            .ok_or_else(|| BookingError::ReservationNotFound(reservation_id.to_string()))
    }

    pub(crate) async fn notify(&self, notification: Notification) {
        // Best-effort only; the sink logs its own failures.
        self.notifier.deliver(notification).await;
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite + recording sink)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use chrono::NaiveDate;
    use lodge_core::ValidationError;
    use lodge_db::{DbConfig, DbError};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, day).unwrap()
    }

    fn operator() -> Actor {
        Actor::Operator {
            id: "owner-1".into(),
        }
    }

    async fn service() -> (BookingService, Arc<RecordingNotifier>, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let breakfast = AddOn {
            name: "Breakfast".into(),
            price_cents: 1500,
            currency: "EUR".into(),
        };
        let room = db
            .rooms()
            .create("owner-1", "Garden Room", Some(2), &[breakfast])
            .await
            .unwrap();
        db.periods()
            .create(&room.id, d(1), d(28), 10000, "EUR")
            .await
            .unwrap();

        let service = BookingService::new(db, notifier.clone());
        (service, notifier, room.id)
    }

    #[tokio::test]
    async fn test_request_freezes_quote_and_notifies() {
        let (service, notifier, room_id) = service().await;

        let reservation = service
            .request_reservation(&room_id, "guest-1", d(10), d(13), vec![], Utc::now())
            .await
            .unwrap();

        assert_eq!(reservation.status, ReservationStatus::Requested);
        assert_eq!(reservation.total_price_cents, 30000);

        let delivered = notifier.delivered.lock().unwrap();
        assert_eq!(
            delivered[0],
            Notification::ReservationRequested {
                reservation_id: reservation.id.clone()
            }
        );
    }

    #[tokio::test]
    async fn test_request_with_add_on_included_in_total() {
        let (service, _, room_id) = service().await;

        let selection = vec![AddOn {
            name: "Breakfast".into(),
            price_cents: 1500,
            currency: "EUR".into(),
        }];
        let reservation = service
            .request_reservation(&room_id, "guest-1", d(10), d(12), selection, Utc::now())
            .await
            .unwrap();

        assert_eq!(reservation.total_price_cents, 21500);
        assert_eq!(reservation.selected_add_ons.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_add_on_rejected() {
        let (service, _, room_id) = service().await;

        let selection = vec![AddOn {
            name: "Helicopter".into(),
            price_cents: 1500,
            currency: "EUR".into(),
        }];
        let err = service
            .request_reservation(&room_id, "guest-1", d(10), d(12), selection, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Validation(ValidationError::UnknownAddOn { .. })
        ));
    }

    #[tokio::test]
    async fn test_uncovered_dates_rejected() {
        let (service, _, room_id) = service().await;

        let err = service
            .request_reservation(&room_id, "guest-1", d(25), d(30), vec![], Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Validation(ValidationError::NotFullyCovered)
        ));
    }

    #[tokio::test]
    async fn test_approve_then_overlapping_request_blocked() {
        let (service, _, room_id) = service().await;
        let now = Utc::now();

        let reservation = service
            .request_reservation(&room_id, "guest-1", d(10), d(13), vec![], now)
            .await
            .unwrap();
        service.approve(&reservation.id, &operator(), now).await.unwrap();

        let err = service
            .request_reservation(&room_id, "guest-2", d(12), d(15), vec![], now)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Validation(ValidationError::OverlapsReservation)
        ));
    }

    #[tokio::test]
    async fn test_competing_approvals_second_fails() {
        let (service, _, room_id) = service().await;
        let now = Utc::now();

        let a = service
            .request_reservation(&room_id, "guest-1", d(10), d(13), vec![], now)
            .await
            .unwrap();
        let b = service
            .request_reservation(&room_id, "guest-2", d(11), d(14), vec![], now)
            .await
            .unwrap();

        service.approve(&a.id, &operator(), now).await.unwrap();
        let err = service.approve(&b.id, &operator(), now).await.unwrap_err();
        assert!(matches!(err, BookingError::Db(DbError::ReservationOverlap)));
    }

    #[tokio::test]
    async fn test_decline_and_cancel() {
        let (service, _, room_id) = service().await;
        let now = Utc::now();

        let a = service
            .request_reservation(&room_id, "guest-1", d(10), d(13), vec![], now)
            .await
            .unwrap();
        let declined = service.decline(&a.id, &operator(), now).await.unwrap();
        assert_eq!(declined.status, ReservationStatus::Declined);

        // Declined rows no longer hold anything: new requests go through.
        let b = service
            .request_reservation(&room_id, "guest-2", d(10), d(13), vec![], now)
            .await
            .unwrap();

        let canceled = service
            .cancel(&b.id, &Actor::Guest { id: "guest-2".into() }, now)
            .await
            .unwrap();
        assert!(canceled);

        // Canceling again is a no-op, not an error.
        let again = service
            .cancel(&b.id, &Actor::Guest { id: "guest-2".into() }, now)
            .await
            .unwrap();
        assert!(!again);
    }

    #[tokio::test]
    async fn test_availability_subtracts_reserved_nights_only() {
        let (service, _, room_id) = service().await;
        let now = Utc::now();

        // Whole period open: [1, 28) exported inclusively.
        let open = service.availability(&room_id).await.unwrap();
        assert_eq!(open, vec![DateRange { from: d(1), to: d(27) }]);

        // A pending request holds nothing on the calendar.
        let r = service
            .request_reservation(&room_id, "guest-1", d(10), d(13), vec![], now)
            .await
            .unwrap();
        let open = service.availability(&room_id).await.unwrap();
        assert_eq!(open.len(), 1);

        // Approval carves out the nights; the checkout day stays free.
        service.approve(&r.id, &operator(), now).await.unwrap();
        let open = service.availability(&room_id).await.unwrap();
        assert_eq!(
            open,
            vec![
                DateRange { from: d(1), to: d(9) },
                DateRange { from: d(13), to: d(27) },
            ]
        );
    }
}
