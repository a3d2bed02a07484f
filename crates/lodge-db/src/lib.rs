//! # lodge-db: Database Layer for Lodge
//!
//! SQLite persistence for the reservation engine: connection pooling,
//! embedded migrations and repositories.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       lodge-db Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  lodge-booking (orchestration)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                      Database (pool.rs)                         │   │
//! │  │          Connection pool + WAL config + migrations              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌────────────┬────────────────┼──────────────────┬───────────────┐   │
//! │  │            │                │                  │               │   │
//! │  ▼            ▼                ▼                  ▼               │   │
//! │ RoomRepo   PeriodRepo   ReservationRepo      ReviewRepo           │   │
//! │                                                                    │   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarded Writes
//!
//! Read-time checks in `lodge-core` are advisory; the authoritative guards
//! are single-statement conditional writes here:
//!
//! - reservation creation: `INSERT ... SELECT ... WHERE NOT EXISTS (overlap)`
//! - approval: `UPDATE ... WHERE status = 'requested' AND NOT EXISTS (overlap)`
//! - review request claims: `UPDATE ... WHERE review_request_sent_at IS NULL`
//!
//! Under SQLite's single-writer model each of these statements is atomic,
//! so two racing entry points cannot both succeed.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::period::PeriodRepository;
pub use repository::reservation::ReservationRepository;
pub use repository::review::{Review, ReviewRepository};
pub use repository::room::RoomRepository;
