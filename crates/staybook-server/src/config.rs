//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use staybook_shared::constants::{APP_NAME, DEFAULT_ADVANCE_PERCENT, DEFAULT_HTTP_PORT};
use staybook_shared::BookingStatus;

/// Business rules applied by the reservation flow and the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    /// Status a new booking starts in: `pending` or `confirmed`.
    pub initial_status: BookingStatus,
    /// Share of the total collected up front when the room sets no flat
    /// advance.
    pub advance_percent: u8,
    /// Reject status changes the transition table does not allow.
    pub strict_transitions: bool,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            initial_status: BookingStatus::Pending,
            advance_percent: DEFAULT_ADVANCE_PERCENT,
            strict_transitions: true,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: none (platform data directory). `:memory:` keeps it in RAM.
    pub database_path: Option<PathBuf>,

    /// Human-readable name reported by `/info`.
    /// Env: `SITE_NAME`
    /// Default: [`APP_NAME`]
    pub site_name: String,

    /// Env: `INITIAL_BOOKING_STATUS`, `ADVANCE_PERCENT`, `STRICT_TRANSITIONS`
    pub booking: BookingPolicy,

    /// Admin API bearer token. Required to access /admin/* endpoints.
    /// Env: `ADMIN_TOKEN`
    /// Default: empty (admin API disabled).
    pub admin_token: Option<String>,

    /// Sustained requests per second allowed per client IP.
    /// Env: `RATE_LIMIT_PER_SEC`
    pub rate_limit_per_sec: f64,

    /// Burst size per client IP.
    /// Env: `RATE_LIMIT_BURST`
    pub rate_limit_burst: f64,

    /// Include internal error text in 5xx responses (development only).
    /// Env: `EXPOSE_ERROR_DETAILS`
    /// Default: `false`
    pub expose_error_details: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            site_name: APP_NAME.to_string(),
            booking: BookingPolicy::default(),
            admin_token: None,
            rate_limit_per_sec: 10.0,
            rate_limit_burst: 30.0,
            expose_error_details: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(name) = lookup("SITE_NAME") {
            config.site_name = name;
        }

        if let Some(val) = lookup("INITIAL_BOOKING_STATUS") {
            match val.parse::<BookingStatus>() {
                Ok(status) if status.is_initial() => config.booking.initial_status = status,
                _ => tracing::warn!(
                    value = %val,
                    "INITIAL_BOOKING_STATUS must be pending or confirmed, using default"
                ),
            }
        }

        if let Some(val) = lookup("ADVANCE_PERCENT") {
            match val.parse::<u8>() {
                Ok(p) if p <= 100 => config.booking.advance_percent = p,
                _ => tracing::warn!(value = %val, "Invalid ADVANCE_PERCENT, using default"),
            }
        }

        if let Some(val) = lookup("STRICT_TRANSITIONS") {
            config.booking.strict_transitions = parse_flag(&val);
        }

        if let Some(token) = lookup("ADMIN_TOKEN") {
            if !token.is_empty() {
                config.admin_token = Some(token);
            }
        }

        if let Some(val) = lookup("RATE_LIMIT_PER_SEC") {
            match val.parse::<f64>() {
                Ok(rate) if rate > 0.0 => config.rate_limit_per_sec = rate,
                _ => tracing::warn!(value = %val, "Invalid RATE_LIMIT_PER_SEC, using default"),
            }
        }

        if let Some(val) = lookup("RATE_LIMIT_BURST") {
            match val.parse::<f64>() {
                Ok(burst) if burst >= 1.0 => config.rate_limit_burst = burst,
                _ => tracing::warn!(value = %val, "Invalid RATE_LIMIT_BURST, using default"),
            }
        }

        if let Some(val) = lookup("EXPOSE_ERROR_DETAILS") {
            config.expose_error_details = parse_flag(&val);
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

fn parse_flag(val: &str) -> bool {
    val != "false" && val != "0"
}
