//! # Reservation Repository
//!
//! Database operations for reservations. Lifecycle decisions are made in
//! `lodge-core`; this repository persists them with guarded writes so that
//! concurrent entry points cannot corrupt the invariants.
//!
//! ## Guarded Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create()           INSERT ... WHERE NOT EXISTS (reserved overlap)      │
//! │  approve()          UPDATE ... WHERE status='requested'                 │
//! │                                 AND NOT EXISTS (reserved overlap)       │
//! │  persist(expected)  UPDATE ... WHERE status = expected (CAS)            │
//! │  claim_review..()   UPDATE ... WHERE review_request_sent_at IS NULL     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A CAS update returning zero affected rows means another writer won; the
//! caller re-reads and re-decides instead of retrying blindly.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use lodge_core::{AddOn, Reservation, ReservationStatus};

/// Raw database row. The add-on snapshot is stored as a JSON TEXT column
/// and parsed on the way out.
#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    id: String,
    room_id: String,
    guest_id: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: ReservationStatus,
    total_price_cents: i64,
    currency: String,
    selected_add_ons: String,
    approved_at: Option<DateTime<Utc>>,
    payment_deadline: Option<DateTime<Utc>>,
    refunded_at: Option<DateTime<Utc>>,
    status_changed_at: DateTime<Utc>,
    review_request_sent_at: Option<DateTime<Utc>>,
    checkout_session_id: Option<String>,
    payment_intent_id: Option<String>,
    refund_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReservationRow {
    fn into_reservation(self) -> DbResult<Reservation> {
        let selected_add_ons: Vec<AddOn> = serde_json::from_str(&self.selected_add_ons)?;
        Ok(Reservation {
            id: self.id,
            room_id: self.room_id,
            guest_id: self.guest_id,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status,
            total_price_cents: self.total_price_cents,
            currency: self.currency,
            selected_add_ons,
            approved_at: self.approved_at,
            payment_deadline: self.payment_deadline,
            refunded_at: self.refunded_at,
            status_changed_at: self.status_changed_at,
            review_request_sent_at: self.review_request_sent_at,
            checkout_session_id: self.checkout_session_id,
            payment_intent_id: self.payment_intent_id,
            refund_id: self.refund_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const RESERVATION_COLUMNS: &str = "id, room_id, guest_id, start_date, end_date, status, \
     total_price_cents, currency, selected_add_ons, approved_at, payment_deadline, \
     refunded_at, status_changed_at, review_request_sent_at, checkout_session_id, \
     payment_intent_id, refund_id, created_at, updated_at";

/// Repository for reservation database operations.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
}

impl ReservationRepository {
    /// Creates a new ReservationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReservationRepository { pool }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Inserts a new reservation, guarded against overlapping a reservation
    /// in a reserved status (approved_pending_payment, confirmed_paid).
    ///
    /// The guard is part of the INSERT statement, which SQLite executes
    /// atomically under its single-writer model: of two racing inserts for
    /// the same nights at most one can observe "no overlap".
    ///
    /// Overlapping `requested` rows do NOT block - competing requests for
    /// the same dates are allowed until one is approved.
    pub async fn create(&self, reservation: &Reservation) -> DbResult<()> {
        debug!(
            id = %reservation.id,
            room_id = %reservation.room_id,
            start = %reservation.start_date,
            end = %reservation.end_date,
            "Creating reservation"
        );

        let add_ons_json = serde_json::to_string(&reservation.selected_add_ons)?;

        let result = sqlx::query(
            r#"
            INSERT INTO reservations
                (id, room_id, guest_id, start_date, end_date, status,
                 total_price_cents, currency, selected_add_ons,
                 status_changed_at, created_at, updated_at)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12
            WHERE NOT EXISTS (
                SELECT 1 FROM reservations
                WHERE room_id = ?2
                  AND status IN (?13, ?14)
                  AND start_date < ?5
                  AND end_date > ?4
            )
            "#,
        )
        .bind(&reservation.id)
        .bind(&reservation.room_id)
        .bind(&reservation.guest_id)
        .bind(reservation.start_date)
        .bind(reservation.end_date)
        .bind(reservation.status.as_str())
        .bind(reservation.total_price_cents)
        .bind(&reservation.currency)
        .bind(&add_ons_json)
        .bind(reservation.status_changed_at)
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .bind(ReservationStatus::ApprovedPendingPayment.as_str())
        .bind(ReservationStatus::ConfirmedPaid.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::ReservationOverlap);
        }

        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Gets a reservation by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Reservation>> {
        self.fetch_one_where("id = ?1", id).await
    }

    /// Finds the reservation holding a checkout session reference.
    pub async fn find_by_checkout_session(&self, session_id: &str) -> DbResult<Option<Reservation>> {
        self.fetch_one_where("checkout_session_id = ?1", session_id)
            .await
    }

    /// Finds the reservation holding a payment intent reference.
    pub async fn find_by_payment_intent(&self, intent_id: &str) -> DbResult<Option<Reservation>> {
        self.fetch_one_where("payment_intent_id = ?1", intent_id)
            .await
    }

    /// Finds the reservation holding a refund reference.
    pub async fn find_by_refund_id(&self, refund_id: &str) -> DbResult<Option<Reservation>> {
        self.fetch_one_where("refund_id = ?1", refund_id).await
    }

    async fn fetch_one_where(&self, clause: &str, value: &str) -> DbResult<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE {clause}"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ReservationRow::into_reservation).transpose()
    }

    /// Lists all reservations of a room, newest first.
    pub async fn list_for_room(&self, room_id: &str) -> DbResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations
             WHERE room_id = ?1
             ORDER BY created_at DESC"
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReservationRow::into_reservation).collect()
    }

    /// Reservations of a room in a reserved status overlapping
    /// `[start_date, end_date)`. Read path for quoting.
    pub async fn reserved_overlapping(
        &self,
        room_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> DbResult<Vec<Reservation>> {
        self.overlapping_in_statuses(room_id, start_date, end_date, &ReservationStatus::RESERVED)
            .await
    }

    /// Reservations of a room blocking period edits overlapping the range
    /// (reserved statuses plus `requested`). Read path for block previews.
    pub async fn blocking_overlapping(
        &self,
        room_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> DbResult<Vec<Reservation>> {
        self.overlapping_in_statuses(
            room_id,
            start_date,
            end_date,
            &ReservationStatus::BLOCKS_PERIOD_EDITS,
        )
        .await
    }

    async fn overlapping_in_statuses(
        &self,
        room_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        statuses: &[ReservationStatus],
    ) -> DbResult<Vec<Reservation>> {
        let placeholders: Vec<String> = (0..statuses.len())
            .map(|i| format!("?{}", i + 4))
            .collect();
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations
             WHERE room_id = ?1
               AND start_date < ?3
               AND end_date > ?2
               AND status IN ({})
             ORDER BY start_date",
            placeholders.join(", ")
        );

        let mut query = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(room_id)
            .bind(start_date)
            .bind(end_date);
        for status in statuses {
            query = query.bind(status.as_str());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(ReservationRow::into_reservation).collect()
    }

    // =========================================================================
    // Lifecycle writes
    // =========================================================================

    /// Persists an approval. Two guards in one statement:
    /// - the row must still be in `requested` status (CAS)
    /// - no reserved reservation may overlap the dates (the approval is
    ///   what creates the hold, so this is where the exclusivity race is
    ///   decided between competing requests)
    pub async fn approve(&self, reservation: &Reservation) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET status = ?1,
                approved_at = ?2,
                payment_deadline = ?3,
                status_changed_at = ?4,
                updated_at = ?5
            WHERE id = ?6
              AND status = ?7
              AND NOT EXISTS (
                  SELECT 1 FROM reservations other
                  WHERE other.room_id = ?8
                    AND other.id != ?6
                    AND other.status IN (?9, ?10)
                    AND other.start_date < ?12
                    AND other.end_date > ?11
              )
            "#,
        )
        .bind(ReservationStatus::ApprovedPendingPayment.as_str())
        .bind(reservation.approved_at)
        .bind(reservation.payment_deadline)
        .bind(reservation.status_changed_at)
        .bind(reservation.updated_at)
        .bind(&reservation.id)
        .bind(ReservationStatus::Requested.as_str())
        .bind(&reservation.room_id)
        .bind(ReservationStatus::ApprovedPendingPayment.as_str())
        .bind(ReservationStatus::ConfirmedPaid.as_str())
        .bind(reservation.start_date)
        .bind(reservation.end_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish losing to an overlapping hold from losing a
            // status race on the row itself.
            let overlap = self
                .reserved_overlapping(
                    &reservation.room_id,
                    reservation.start_date,
                    reservation.end_date,
                )
                .await?;
            if overlap.iter().any(|r| r.id != reservation.id) {
                return Err(DbError::ReservationOverlap);
            }
            return Err(DbError::QueryFailed(
                "reservation is no longer in requested status".to_string(),
            ));
        }

        debug!(id = %reservation.id, "Reservation approved");
        Ok(())
    }

    /// Persists a lifecycle transition with a compare-and-set on the status.
    ///
    /// Writes every mutable lifecycle column from the in-memory reservation.
    /// Returns `false` when the row was no longer in `expected` status, in
    /// which case nothing was written.
    pub async fn persist_transition(
        &self,
        reservation: &Reservation,
        expected: ReservationStatus,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET status = ?1,
                approved_at = ?2,
                payment_deadline = ?3,
                refunded_at = ?4,
                status_changed_at = ?5,
                checkout_session_id = ?6,
                payment_intent_id = ?7,
                refund_id = ?8,
                updated_at = ?9
            WHERE id = ?10
              AND status = ?11
            "#,
        )
        .bind(reservation.status.as_str())
        .bind(reservation.approved_at)
        .bind(reservation.payment_deadline)
        .bind(reservation.refunded_at)
        .bind(reservation.status_changed_at)
        .bind(&reservation.checkout_session_id)
        .bind(&reservation.payment_intent_id)
        .bind(&reservation.refund_id)
        .bind(reservation.updated_at)
        .bind(&reservation.id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        let written = result.rows_affected() > 0;
        debug!(
            id = %reservation.id,
            from = expected.as_str(),
            to = reservation.status.as_str(),
            written,
            "Persisted transition"
        );
        Ok(written)
    }

    /// Backfills external payment references without touching status.
    ///
    /// `COALESCE` keeps an already-set reference: once a checkout session or
    /// payment intent is recorded it never changes.
    pub async fn set_checkout_refs(
        &self,
        id: &str,
        checkout_session_id: &str,
        payment_intent_id: Option<&str>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET checkout_session_id = COALESCE(checkout_session_id, ?1),
                payment_intent_id = COALESCE(payment_intent_id, ?2),
                updated_at = ?3
            WHERE id = ?4
            "#,
        )
        .bind(checkout_session_id)
        .bind(payment_intent_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Reservation", id));
        }

        Ok(())
    }

    /// Claims the right to send the post-stay review request.
    ///
    /// Returns `true` for exactly one caller per reservation: the claim is
    /// a conditional update on `review_request_sent_at IS NULL`, so a sweep
    /// re-running over the same rows sends nothing twice.
    pub async fn claim_review_request(&self, id: &str, now: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET review_request_sent_at = ?1,
                updated_at = ?1
            WHERE id = ?2
              AND review_request_sent_at IS NULL
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Sweep queries
    // =========================================================================

    /// Approved reservations whose payment deadline has passed.
    pub async fn list_overdue_pending(&self, now: DateTime<Utc>) -> DbResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations
             WHERE status = ?1
               AND payment_deadline IS NOT NULL
               AND payment_deadline < ?2
             ORDER BY payment_deadline"
        ))
        .bind(ReservationStatus::ApprovedPendingPayment.as_str())
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReservationRow::into_reservation).collect()
    }

    /// Requested reservations whose stay has already ended without an
    /// operator decision.
    pub async fn list_stale_requests(&self, as_of: NaiveDate) -> DbResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations
             WHERE status = ?1
               AND end_date <= ?2
             ORDER BY end_date"
        ))
        .bind(ReservationStatus::Requested.as_str())
        .bind(as_of)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReservationRow::into_reservation).collect()
    }

    /// Candidates for the review-request sweep: stays that checked out the
    /// day before `as_of`, were paid (or later refunded), with no review
    /// yet and no request sent.
    ///
    /// The exact-day match means a sweep that skips a day skips those
    /// requests instead of nagging guests weeks later.
    pub async fn list_review_request_candidates(
        &self,
        as_of: NaiveDate,
    ) -> DbResult<Vec<Reservation>> {
        let checkout_day = as_of.pred_opt().unwrap_or(as_of);

        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM (
                 SELECT r.* FROM reservations r
                 LEFT JOIN reviews v ON v.reservation_id = r.id
                 WHERE r.status IN (?1, ?2)
                   AND r.end_date = ?3
                   AND r.review_request_sent_at IS NULL
                   AND v.id IS NULL
             )
             ORDER BY end_date"
        ))
        .bind(ReservationStatus::ConfirmedPaid.as_str())
        .bind(ReservationStatus::Refunded.as_str())
        .bind(checkout_day)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReservationRow::into_reservation).collect()
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, NaiveDate};
    use lodge_core::{Actor, Money, Quote};
    use uuid::Uuid;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, day).unwrap()
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn room(db: &Database) -> String {
        db.rooms()
            .create("owner-1", "Room", None, &[])
            .await
            .unwrap()
            .id
    }

    fn quote(total_cents: i64) -> Quote {
        Quote {
            nights: 3,
            segments: vec![],
            nightly_price: None,
            currency: "EUR".into(),
            total: Money::from_cents(total_cents),
        }
    }

    fn new_reservation(room_id: &str, start: u32, end: u32) -> Reservation {
        Reservation::request(
            Uuid::new_v4().to_string(),
            room_id.to_string(),
            "guest-1".to_string(),
            d(start),
            d(end),
            vec![],
            &quote(27000),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = test_db().await;
        let room_id = room(&db).await;
        let repo = db.reservations();

        let reservation = new_reservation(&room_id, 10, 13);
        repo.create(&reservation).await.unwrap();

        let found = repo.get_by_id(&reservation.id).await.unwrap().unwrap();
        assert_eq!(found.status, ReservationStatus::Requested);
        assert_eq!(found.total_price_cents, 27000);
        assert_eq!(found.nights(), 3);
    }

    #[tokio::test]
    async fn test_competing_requests_allowed() {
        let db = test_db().await;
        let room_id = room(&db).await;
        let repo = db.reservations();

        repo.create(&new_reservation(&room_id, 10, 13)).await.unwrap();
        // Same dates, still requested: allowed.
        repo.create(&new_reservation(&room_id, 10, 13)).await.unwrap();
    }

    #[tokio::test]
    async fn test_reserved_hold_blocks_new_request() {
        let db = test_db().await;
        let room_id = room(&db).await;
        let repo = db.reservations();

        let mut first = new_reservation(&room_id, 10, 13);
        repo.create(&first).await.unwrap();
        first
            .approve(&Actor::Operator { id: "owner-1".into() }, Utc::now())
            .unwrap();
        repo.approve(&first).await.unwrap();

        let err = repo.create(&new_reservation(&room_id, 12, 15)).await;
        assert!(matches!(err, Err(DbError::ReservationOverlap)));

        // Touching dates are fine.
        repo.create(&new_reservation(&room_id, 13, 16)).await.unwrap();
    }

    #[tokio::test]
    async fn test_approve_race_second_loser_gets_overlap() {
        let db = test_db().await;
        let room_id = room(&db).await;
        let repo = db.reservations();

        let mut a = new_reservation(&room_id, 10, 13);
        let mut b = new_reservation(&room_id, 11, 14);
        repo.create(&a).await.unwrap();
        repo.create(&b).await.unwrap();

        let operator = Actor::Operator { id: "owner-1".into() };
        a.approve(&operator, Utc::now()).unwrap();
        repo.approve(&a).await.unwrap();

        b.approve(&operator, Utc::now()).unwrap();
        let err = repo.approve(&b).await;
        assert!(matches!(err, Err(DbError::ReservationOverlap)));

        // The loser is still requested in the database.
        let stored = repo.get_by_id(&b.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Requested);
    }

    #[tokio::test]
    async fn test_persist_transition_cas() {
        let db = test_db().await;
        let room_id = room(&db).await;
        let repo = db.reservations();

        let mut reservation = new_reservation(&room_id, 10, 13);
        repo.create(&reservation).await.unwrap();

        reservation
            .decline(&Actor::Operator { id: "owner-1".into() }, Utc::now())
            .unwrap();
        let written = repo
            .persist_transition(&reservation, ReservationStatus::Requested)
            .await
            .unwrap();
        assert!(written);

        // Second write with the same expectation loses the CAS.
        let written = repo
            .persist_transition(&reservation, ReservationStatus::Requested)
            .await
            .unwrap();
        assert!(!written);

        let stored = repo.get_by_id(&reservation.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Declined);
    }

    #[tokio::test]
    async fn test_checkout_refs_are_write_once() {
        let db = test_db().await;
        let room_id = room(&db).await;
        let repo = db.reservations();

        let reservation = new_reservation(&room_id, 10, 13);
        repo.create(&reservation).await.unwrap();

        repo.set_checkout_refs(&reservation.id, "cs_1", Some("pi_1"))
            .await
            .unwrap();
        repo.set_checkout_refs(&reservation.id, "cs_2", Some("pi_2"))
            .await
            .unwrap();

        let stored = repo.get_by_id(&reservation.id).await.unwrap().unwrap();
        assert_eq!(stored.checkout_session_id.as_deref(), Some("cs_1"));
        assert_eq!(stored.payment_intent_id.as_deref(), Some("pi_1"));

        let by_session = repo.find_by_checkout_session("cs_1").await.unwrap().unwrap();
        assert_eq!(by_session.id, reservation.id);
    }

    #[tokio::test]
    async fn test_review_request_claimed_once() {
        let db = test_db().await;
        let room_id = room(&db).await;
        let repo = db.reservations();

        let reservation = new_reservation(&room_id, 10, 13);
        repo.create(&reservation).await.unwrap();

        let now = Utc::now();
        assert!(repo.claim_review_request(&reservation.id, now).await.unwrap());
        assert!(!repo.claim_review_request(&reservation.id, now).await.unwrap());
    }

    #[tokio::test]
    async fn test_overdue_pending_sweep_query() {
        let db = test_db().await;
        let room_id = room(&db).await;
        let repo = db.reservations();

        let approved_long_ago = Utc::now() - Duration::hours(72);
        let mut reservation = new_reservation(&room_id, 10, 13);
        repo.create(&reservation).await.unwrap();
        reservation
            .approve(&Actor::Operator { id: "owner-1".into() }, approved_long_ago)
            .unwrap();
        repo.approve(&reservation).await.unwrap();

        let overdue = repo.list_overdue_pending(Utc::now()).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, reservation.id);

        // Not yet overdue as of the approval moment.
        let not_yet = repo.list_overdue_pending(approved_long_ago).await.unwrap();
        assert!(not_yet.is_empty());
    }

    #[tokio::test]
    async fn test_stale_request_sweep_query() {
        let db = test_db().await;
        let room_id = room(&db).await;
        let repo = db.reservations();

        repo.create(&new_reservation(&room_id, 10, 13)).await.unwrap();

        let stale = repo.list_stale_requests(d(13)).await.unwrap();
        assert_eq!(stale.len(), 1);

        let none = repo.list_stale_requests(d(12)).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_period_block_rejected_over_reservation() {
        let db = test_db().await;
        let room_id = room(&db).await;

        let period = db
            .periods()
            .create(&room_id, d(1), d(20), 9000, "EUR")
            .await
            .unwrap();

        db.reservations()
            .create(&new_reservation(&room_id, 10, 13))
            .await
            .unwrap();

        // A requested reservation blocks edits even though it holds no dates.
        let err = db.periods().block_range(&period.id, d(8), d(12)).await;
        assert!(matches!(err, Err(DbError::BlockedByReservation)));

        // Blocking a disjoint sub-range still works.
        db.periods().block_range(&period.id, d(1), d(5)).await.unwrap();
    }
}
