//! # staybook-server
//!
//! HTTP service for the Staybook booking system.
//!
//! This binary provides:
//! - **Host onboarding**: accounts, properties and rooms
//! - **Reservations**: availability checks, pricing and booking creation
//! - **Booking lifecycle**: host/admin status transitions with an audit log
//! - **Per-IP rate limiting** and an admin status endpoint

mod actor;
mod api;
mod config;
mod db;
mod error;
mod lifecycle;
mod rate_limit;
mod reservation;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::db::{DbLocation, SharedDb};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,staybook_server=debug")),
        )
        .init();

    info!("Starting Staybook server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        http_addr = %config.http_addr,
        database = ?config.database_path,
        "Loaded configuration"
    );
    info!(
        site = %config.site_name,
        initial_status = %config.booking.initial_status,
        strict_transitions = config.booking.strict_transitions,
        admin_enabled = config.admin_token.is_some(),
        "Booking policy"
    );
    error::set_expose_details(config.expose_error_details);

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let db = Arc::new(SharedDb::new(DbLocation::from(config.database_path.clone())));

    // Open eagerly so a bad path or failed migration stops startup.
    let counts = db.run(|db| Ok(db.counts()?)).await?;
    info!(
        properties = counts.properties,
        rooms = counts.rooms,
        bookings = counts.bookings,
        "Database ready"
    );

    let http_addr = config.http_addr;
    let app_state = AppState::new(Arc::clone(&db), config);

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    let rl = app_state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rl.purge_stale(600.0).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server until it fails or Ctrl+C arrives
    // -----------------------------------------------------------------------
    let result = tokio::select! {
        result = api::serve(app_state, http_addr) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "HTTP server failed");
    }

    db.teardown()?;
    result
}
