//! Shared application state.

use lodge_booking::{BookingService, PaymentService};
use lodge_db::Database;

use crate::config::ServerConfig;

/// State shared by every HTTP handler.
pub struct AppState {
    pub db: Database,
    pub booking: BookingService,
    pub payments: PaymentService,
    pub config: ServerConfig,
}
