//! # Room Repository
//!
//! Database operations for rooms and their add-on catalogs.
//!
//! The add-on catalog is stored as a JSON TEXT column rather than a child
//! table: it is a small bounded list (≤ 5 entries) that is always read and
//! written as a whole with the room.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use lodge_core::{AddOn, Room, MAX_SELECTED_ADD_ONS};

/// Raw database row for a room. The JSON column is parsed into the domain
/// type on the way out.
#[derive(Debug, sqlx::FromRow)]
struct RoomRow {
    id: String,
    owner_id: String,
    name: String,
    capacity: Option<i64>,
    add_ons: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoomRow {
    fn into_room(self) -> DbResult<Room> {
        let add_ons: Vec<AddOn> = serde_json::from_str(&self.add_ons)?;
        Ok(Room {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            capacity: self.capacity,
            add_ons,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for room database operations.
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: SqlitePool,
}

impl RoomRepository {
    /// Creates a new RoomRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RoomRepository { pool }
    }

    /// Creates a room with the given add-on catalog.
    ///
    /// The catalog is capped at [`MAX_SELECTED_ADD_ONS`] entries; a larger
    /// catalog is a caller bug and is rejected here as well.
    pub async fn create(
        &self,
        owner_id: &str,
        name: &str,
        capacity: Option<i64>,
        add_ons: &[AddOn],
    ) -> DbResult<Room> {
        if add_ons.len() > MAX_SELECTED_ADD_ONS {
            return Err(DbError::Internal(format!(
                "add-on catalog too large: {} entries",
                add_ons.len()
            )));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let add_ons_json = serde_json::to_string(add_ons)?;

        debug!(id = %id, name = %name, "Creating room");

        sqlx::query(
            r#"
            INSERT INTO rooms (id, owner_id, name, capacity, add_ons, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(owner_id)
        .bind(name)
        .bind(capacity)
        .bind(&add_ons_json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Room {
            id,
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            capacity,
            add_ons: add_ons.to_vec(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a room by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Room>> {
        let row: Option<RoomRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, name, capacity, add_ons, created_at, updated_at
            FROM rooms
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RoomRow::into_room).transpose()
    }

    /// Lists rooms belonging to an operator.
    pub async fn list_by_owner(&self, owner_id: &str) -> DbResult<Vec<Room>> {
        let rows: Vec<RoomRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, name, capacity, add_ons, created_at, updated_at
            FROM rooms
            WHERE owner_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RoomRow::into_room).collect()
    }

    /// Replaces the add-on catalog of a room.
    pub async fn update_add_ons(&self, id: &str, add_ons: &[AddOn]) -> DbResult<()> {
        if add_ons.len() > MAX_SELECTED_ADD_ONS {
            return Err(DbError::Internal(format!(
                "add-on catalog too large: {} entries",
                add_ons.len()
            )));
        }

        let add_ons_json = serde_json::to_string(add_ons)?;

        let result = sqlx::query(
            "UPDATE rooms SET add_ons = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(&add_ons_json)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Room", id));
        }

        Ok(())
    }
}

// =============================================================================
// Integration Tests (in-memory SQLite)
// =============================================================================
