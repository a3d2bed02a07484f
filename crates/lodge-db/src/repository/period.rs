//! # Priced-Period Repository
//!
//! Database operations for priced periods: creation with an overlap guard,
//! range lookups for quoting, and the atomic block operation.
//!
//! ## Blocking a Range
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │               block_range() - one transaction                           │
//! │                                                                         │
//! │  1. SELECT the period (row must exist)                                  │
//! │  2. Re-check blocking reservations INSIDE the transaction               │
//! │     └── any overlap → rollback, BlockedByReservation                    │
//! │  3. Apply the plan from lodge_core::plan_block:                         │
//! │     Delete      → DELETE the row                                        │
//! │     ShrinkStart → UPDATE start_date                                     │
//! │     ShrinkEnd   → UPDATE end_date                                       │
//! │     Split       → UPDATE end_date + INSERT tail with same rate          │
//! │  4. COMMIT                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use lodge_core::{plan_block, BlockPlan, PricedPeriod, ReservationStatus};

/// Repository for priced-period database operations.
#[derive(Debug, Clone)]
pub struct PeriodRepository {
    pool: SqlitePool,
}

const PERIOD_COLUMNS: &str =
    "id, room_id, start_date, end_date, nightly_price_cents, currency, created_at, updated_at";

impl PeriodRepository {
    /// Creates a new PeriodRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PeriodRepository { pool }
    }

    /// Creates a priced period, guarded against overlapping an existing
    /// period of the same room.
    ///
    /// The guard is part of the INSERT statement itself: the row only lands
    /// if no overlapping period exists at execution time, so two racing
    /// inserts cannot both succeed.
    pub async fn create(
        &self,
        room_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        nightly_price_cents: i64,
        currency: &str,
    ) -> DbResult<PricedPeriod> {
        if end_date <= start_date {
            return Err(DbError::Internal(format!(
                "invalid period range: {start_date}..{end_date}"
            )));
        }
        if nightly_price_cents <= 0 {
            return Err(DbError::Internal(format!(
                "nightly price must be positive, got {nightly_price_cents}"
            )));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, room_id = %room_id, %start_date, %end_date, "Creating priced period");

        let result = sqlx::query(
            r#"
            INSERT INTO priced_periods
                (id, room_id, start_date, end_date, nightly_price_cents, currency,
                 created_at, updated_at)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
            WHERE NOT EXISTS (
                SELECT 1 FROM priced_periods
                WHERE room_id = ?2
                  AND start_date < ?4
                  AND end_date > ?3
            )
            "#,
        )
        .bind(&id)
        .bind(room_id)
        .bind(start_date)
        .bind(end_date)
        .bind(nightly_price_cents)
        .bind(currency)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::PeriodOverlap);
        }

        Ok(PricedPeriod {
            id,
            room_id: room_id.to_string(),
            start_date,
            end_date,
            nightly_price_cents,
            currency: currency.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a period by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PricedPeriod>> {
        let period: Option<PricedPeriod> = sqlx::query_as(&format!(
            "SELECT {PERIOD_COLUMNS} FROM priced_periods WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(period)
    }

    /// Lists all periods of a room, ordered by start date.
    pub async fn list_for_room(&self, room_id: &str) -> DbResult<Vec<PricedPeriod>> {
        let periods: Vec<PricedPeriod> = sqlx::query_as(&format!(
            "SELECT {PERIOD_COLUMNS} FROM priced_periods
             WHERE room_id = ?1
             ORDER BY start_date"
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(periods)
    }

    /// Periods of a room overlapping `[start_date, end_date)`, ordered by
    /// start date. This is the quote read path.
    pub async fn overlapping(
        &self,
        room_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> DbResult<Vec<PricedPeriod>> {
        let periods: Vec<PricedPeriod> = sqlx::query_as(&format!(
            "SELECT {PERIOD_COLUMNS} FROM priced_periods
             WHERE room_id = ?1
               AND start_date < ?3
               AND end_date > ?2
             ORDER BY start_date"
        ))
        .bind(room_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(periods)
    }

    /// Removes `[block_start, block_end)` from a priced period, atomically.
    ///
    /// Fails with [`DbError::BlockedByReservation`] when any reservation in
    /// a blocking status (requested, approved_pending_payment,
    /// confirmed_paid) overlaps the removed range. The check runs inside the
    /// same transaction as the mutation.
    pub async fn block_range(
        &self,
        period_id: &str,
        block_start: NaiveDate,
        block_end: NaiveDate,
    ) -> DbResult<BlockPlan> {
        let mut tx = self.pool.begin().await?;

        let period: Option<PricedPeriod> = sqlx::query_as(&format!(
            "SELECT {PERIOD_COLUMNS} FROM priced_periods WHERE id = ?1"
        ))
        .bind(period_id)
        .fetch_optional(&mut *tx)
        .await?;

        let period = period.ok_or_else(|| DbError::not_found("PricedPeriod", period_id))?;

        let plan = plan_block(&period, block_start, block_end)
            .map_err(|e| DbError::Internal(e.to_string()))?;

        // Authoritative re-check: a reservation may have landed between the
        // caller's read and this transaction.
        let blocking: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reservations
            WHERE room_id = ?1
              AND status IN (?2, ?3, ?4)
              AND start_date < ?6
              AND end_date > ?5
            "#,
        )
        .bind(&period.room_id)
        .bind(ReservationStatus::Requested.as_str())
        .bind(ReservationStatus::ApprovedPendingPayment.as_str())
        .bind(ReservationStatus::ConfirmedPaid.as_str())
        .bind(block_start)
        .bind(block_end)
        .fetch_one(&mut *tx)
        .await?;

        if blocking > 0 {
            return Err(DbError::BlockedByReservation);
        }

        let now = Utc::now();

        match plan {
            BlockPlan::Delete => {
                sqlx::query("DELETE FROM priced_periods WHERE id = ?1")
                    .bind(period_id)
                    .execute(&mut *tx)
                    .await?;
            }
            BlockPlan::ShrinkStart { new_start } => {
                sqlx::query(
                    "UPDATE priced_periods SET start_date = ?1, updated_at = ?2 WHERE id = ?3",
                )
                .bind(new_start)
                .bind(now)
                .bind(period_id)
                .execute(&mut *tx)
                .await?;
            }
            BlockPlan::ShrinkEnd { new_end } => {
                sqlx::query(
                    "UPDATE priced_periods SET end_date = ?1, updated_at = ?2 WHERE id = ?3",
                )
                .bind(new_end)
                .bind(now)
                .bind(period_id)
                .execute(&mut *tx)
                .await?;
            }
            BlockPlan::Split {
                left_end,
                tail_start,
            } => {
                sqlx::query(
                    "UPDATE priced_periods SET end_date = ?1, updated_at = ?2 WHERE id = ?3",
                )
                .bind(left_end)
                .bind(now)
                .bind(period_id)
                .execute(&mut *tx)
                .await?;

                // Tail keeps the rate and currency; it is a new row with a
                // new identity. Reservations reference rooms, not periods,
                // so nothing else moves.
                sqlx::query(
                    r#"
                    INSERT INTO priced_periods
                        (id, room_id, start_date, end_date, nightly_price_cents, currency,
                         created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                )
                .bind(Uuid::new_v4().to_string())
                .bind(&period.room_id)
                .bind(tail_start)
                .bind(period.end_date)
                .bind(period.nightly_price_cents)
                .bind(&period.currency)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        debug!(period_id = %period_id, ?plan, "Applied block plan");
        Ok(plan)
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================
