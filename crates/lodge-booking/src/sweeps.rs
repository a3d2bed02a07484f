//! # Maintenance Sweeps
//!
//! Time-driven cleanup run on an interval by the server:
//!
//! 1. Expire approved reservations whose payment deadline passed.
//! 2. Cancel requests the operator never answered before the stay ended.
//! 3. Send review requests the morning after checkout.
//!
//! Every sweep is idempotent. Per-row failures are logged and skipped; one
//! bad row never stalls the rest of the batch.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info};

use lodge_core::{Actor, ReservationStatus};
use lodge_db::Database;

use crate::error::BookingResult;
use crate::notify::{Notification, NotificationSink};

/// Runs the periodic maintenance sweeps.
#[derive(Clone)]
pub struct SweepService {
    db: Database,
    notifier: Arc<dyn NotificationSink>,
}

impl SweepService {
    /// Creates a new sweep service.
    pub fn new(db: Database, notifier: Arc<dyn NotificationSink>) -> Self {
        SweepService { db, notifier }
    }

    /// Runs all three sweeps for the given instant.
    pub async fn run_all(&self, now: DateTime<Utc>) {
        if let Err(e) = self.expire_overdue_reservations(now).await {
            error!(error = %e, "Expiry sweep failed");
        }
        if let Err(e) = self.cancel_overdue_unconfirmed_requests(now).await {
            error!(error = %e, "Stale-request sweep failed");
        }
        if let Err(e) = self.send_post_stay_review_requests(now).await {
            error!(error = %e, "Review-request sweep failed");
        }
    }

    /// Expires approved reservations whose 48h payment window lapsed.
    ///
    /// Returns the number of reservations expired. Expiry releases the
    /// dates: the rows leave the reserved statuses.
    pub async fn expire_overdue_reservations(&self, now: DateTime<Utc>) -> BookingResult<usize> {
        let repo = self.db.reservations();
        let overdue = repo.list_overdue_pending(now).await?;
        let mut expired = 0;

        for mut reservation in overdue {
            if !reservation.expire_if_due(now) {
                continue;
            }

            match repo
                .persist_transition(&reservation, ReservationStatus::ApprovedPendingPayment)
                .await
            {
                Ok(true) => {
                    expired += 1;
                    info!(reservation_id = %reservation.id, "Reservation expired");
                    self.notifier
                        .deliver(Notification::ReservationExpired {
                            reservation_id: reservation.id.clone(),
                        })
                        .await;
                }
                // Lost the CAS: a payment or cancel landed first.
                Ok(false) => {}
                Err(e) => {
                    error!(
                        reservation_id = %reservation.id,
                        error = %e,
                        "Failed to persist expiry; skipping row"
                    );
                }
            }
        }

        Ok(expired)
    }

    /// Cancels `requested` reservations whose stay already ended without an
    /// operator decision. The guest gets a cancellation rather than silence.
    pub async fn cancel_overdue_unconfirmed_requests(
        &self,
        now: DateTime<Utc>,
    ) -> BookingResult<usize> {
        let repo = self.db.reservations();
        let stale = repo.list_stale_requests(now.date_naive()).await?;
        let mut canceled = 0;

        // The actor is ignored by the transition; the sweep acts on the
        // operator's behalf.
        let sweep_actor = Actor::Operator {
            id: "sweep".to_string(),
        };

        for mut reservation in stale {
            if !reservation.cancel(&sweep_actor, now) {
                continue;
            }

            match repo
                .persist_transition(&reservation, ReservationStatus::Requested)
                .await
            {
                Ok(true) => {
                    canceled += 1;
                    info!(reservation_id = %reservation.id, "Stale request canceled");
                    self.notifier
                        .deliver(Notification::ReservationCanceled {
                            reservation_id: reservation.id.clone(),
                        })
                        .await;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(
                        reservation_id = %reservation.id,
                        error = %e,
                        "Failed to persist stale-request cancel; skipping row"
                    );
                }
            }
        }

        Ok(canceled)
    }

    /// Sends review requests for stays that checked out yesterday.
    ///
    /// The claim (`review_request_sent_at IS NULL` conditional update) is
    /// what makes the sweep idempotent: exactly one run wins each row, so
    /// overlapping sweeps never double-send.
    pub async fn send_post_stay_review_requests(
        &self,
        now: DateTime<Utc>,
    ) -> BookingResult<usize> {
        let repo = self.db.reservations();
        let candidates = repo.list_review_request_candidates(now.date_naive()).await?;
        let mut sent = 0;

        for reservation in candidates {
            match repo.claim_review_request(&reservation.id, now).await {
                Ok(true) => {
                    sent += 1;
                    info!(reservation_id = %reservation.id, "Review request sent");
                    self.notifier
                        .deliver(Notification::ReviewRequested {
                            reservation_id: reservation.id.clone(),
                        })
                        .await;
                }
                // Claimed by a concurrent run.
                Ok(false) => {}
                Err(e) => {
                    error!(
                        reservation_id = %reservation.id,
                        error = %e,
                        "Failed to claim review request; skipping row"
                    );
                }
            }
        }

        Ok(sent)
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite + recording sink)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use chrono::{Duration, NaiveDate, TimeZone};
    use lodge_core::{Money, Quote, Reservation};
    use lodge_db::DbConfig;
    use uuid::Uuid;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, day).unwrap()
    }

    fn quote() -> Quote {
        Quote {
            nights: 3,
            segments: vec![],
            nightly_price: None,
            currency: "EUR".into(),
            total: Money::from_cents(30000),
        }
    }

    async fn setup() -> (SweepService, Arc<RecordingNotifier>, Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let room = db.rooms().create("owner-1", "Room", None, &[]).await.unwrap();
        let service = SweepService::new(db.clone(), notifier.clone());
        (service, notifier, db, room.id)
    }

    async fn seed_reservation(db: &Database, room_id: &str, start: u32, end: u32) -> Reservation {
        let reservation = Reservation::request(
            Uuid::new_v4().to_string(),
            room_id.to_string(),
            "guest-1".into(),
            d(start),
            d(end),
            vec![],
            &quote(),
            Utc::now(),
        );
        db.reservations().create(&reservation).await.unwrap();
        reservation
    }

    #[tokio::test]
    async fn test_expiry_sweep_releases_dates() {
        let (service, notifier, db, room_id) = setup().await;
        let approved_at = Utc::now() - Duration::hours(72);

        let mut reservation = seed_reservation(&db, &room_id, 10, 13).await;
        reservation
            .approve(&Actor::Operator { id: "owner-1".into() }, approved_at)
            .unwrap();
        db.reservations().approve(&reservation).await.unwrap();

        let expired = service.expire_overdue_reservations(Utc::now()).await.unwrap();
        assert_eq!(expired, 1);

        let stored = db.reservations().get_by_id(&reservation.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Expired);

        // The dates are free again.
        seed_reservation(&db, &room_id, 10, 13).await;

        assert!(notifier
            .delivered
            .lock()
            .unwrap()
            .contains(&Notification::ReservationExpired {
                reservation_id: reservation.id.clone()
            }));

        // Second run finds nothing.
        let expired = service.expire_overdue_reservations(Utc::now()).await.unwrap();
        assert_eq!(expired, 0);
    }

    #[tokio::test]
    async fn test_stale_request_sweep() {
        let (service, _, db, room_id) = setup().await;
        let reservation = seed_reservation(&db, &room_id, 10, 13).await;

        // Stay not over yet: untouched.
        let before = Utc.with_ymd_and_hms(2026, 11, 12, 8, 0, 0).unwrap();
        assert_eq!(
            service.cancel_overdue_unconfirmed_requests(before).await.unwrap(),
            0
        );

        let after = Utc.with_ymd_and_hms(2026, 11, 13, 8, 0, 0).unwrap();
        assert_eq!(
            service.cancel_overdue_unconfirmed_requests(after).await.unwrap(),
            1
        );

        let stored = db.reservations().get_by_id(&reservation.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Canceled);
    }

    #[tokio::test]
    async fn test_review_request_sweep_sends_once() {
        let (service, notifier, db, room_id) = setup().await;
        let now = Utc::now();

        let mut reservation = seed_reservation(&db, &room_id, 10, 13).await;
        reservation
            .approve(&Actor::Operator { id: "owner-1".into() }, now)
            .unwrap();
        db.reservations().approve(&reservation).await.unwrap();
        reservation.apply_checkout_completed("cs_1", Some("pi_1"), now + Duration::hours(1));
        db.reservations()
            .persist_transition(&reservation, ReservationStatus::ApprovedPendingPayment)
            .await
            .unwrap();

        // The morning after checkout (end_date = Nov 13).
        let morning_after = Utc.with_ymd_and_hms(2026, 11, 14, 9, 0, 0).unwrap();

        let sent = service
            .send_post_stay_review_requests(morning_after)
            .await
            .unwrap();
        assert_eq!(sent, 1);
        assert!(notifier
            .delivered
            .lock()
            .unwrap()
            .contains(&Notification::ReviewRequested {
                reservation_id: reservation.id.clone()
            }));

        // Re-run: already claimed.
        let sent = service
            .send_post_stay_review_requests(morning_after)
            .await
            .unwrap();
        assert_eq!(sent, 0);

        // Two days later the exact-day window has moved on.
        let later = Utc.with_ymd_and_hms(2026, 11, 16, 9, 0, 0).unwrap();
        assert_eq!(service.send_post_stay_review_requests(later).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_review_sweep_skips_unpaid_stays() {
        let (service, _, db, room_id) = setup().await;
        seed_reservation(&db, &room_id, 10, 13).await;

        let morning_after = Utc.with_ymd_and_hms(2026, 11, 14, 9, 0, 0).unwrap();
        let sent = service
            .send_post_stay_review_requests(morning_after)
            .await
            .unwrap();
        assert_eq!(sent, 0);
    }
}
