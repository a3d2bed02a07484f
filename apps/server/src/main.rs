//! # Lodge Server
//!
//! HTTP entry point for the reservation engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Lodge Server                                   │
//! │                                                                         │
//! │  Guests/Operators ──► HTTP (8080) ──► lodge-booking ──► SQLite         │
//! │  Payment gateway  ──► /webhooks/payment ───┘                            │
//! │  tokio interval   ──► maintenance sweeps ──┘                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use lodge_booking::{BookingService, PaymentService, SweepService, TracingNotifier, UnconfiguredGateway};
use lodge_db::{Database, DbConfig};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .init();

    info!("Starting Lodge server...");

    // Load configuration
    let config = ServerConfig::load()?;
    info!(
        port = config.http_port,
        db = %config.database_path,
        webhook_secret_set = config.webhook_secret.is_some(),
        "Configuration loaded"
    );

    // Connect to database (runs migrations)
    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    info!("Database ready");

    // Wire services. The gateway client is injected here; without payment
    // credentials the engine runs with checkout/refund disabled.
    let notifier = Arc::new(TracingNotifier);
    let gateway = Arc::new(UnconfiguredGateway);
    let booking = BookingService::new(db.clone(), notifier.clone());
    let payments = PaymentService::new(db.clone(), gateway, notifier.clone());
    let sweeps = SweepService::new(db.clone(), notifier);

    // Maintenance sweeps on an interval, independent of request traffic.
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            sweeps.run_all(Utc::now()).await;
        }
    });

    let state = Arc::new(AppState {
        db,
        booking,
        payments,
        config: config.clone(),
    });

    let app = routes::router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!(%addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
