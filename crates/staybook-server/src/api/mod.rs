//! HTTP API (axum).

pub mod bookings;
pub mod listings;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, Method},
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use staybook_shared::BookingStatus;
use staybook_store::StoreCounts;

use crate::config::ServerConfig;
use crate::db::SharedDb;
use crate::error::ServerError;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SharedDb>,
    pub config: Arc<ServerConfig>,
    pub rate_limiter: RateLimiter,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: Arc<SharedDb>, config: ServerConfig) -> Self {
        Self {
            db,
            rate_limiter: RateLimiter::from_config(&config),
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/admin/status", get(admin_status))
        // Accounts and listings
        .route("/users", post(listings::create_user))
        .route("/properties", post(listings::create_property))
        .route(
            "/properties/{id}",
            get(listings::get_property).patch(listings::update_property),
        )
        .route("/host/properties", get(listings::host_properties))
        .route("/p/{slug}", get(listings::public_page))
        .route(
            "/properties/{id}/rooms",
            get(listings::list_rooms).post(listings::create_room),
        )
        .route("/rooms/{id}", patch(listings::update_room))
        // Bookings
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/{id}", get(bookings::get_booking))
        .route("/bookings/{id}/status", patch(bookings::change_booking_status))
        .route("/rooms/{id}/availability", get(bookings::room_availability))
        .route("/properties/{id}/bookings", get(bookings::property_bookings))
        .route("/me/bookings", get(bookings::my_bookings))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    initial_booking_status: BookingStatus,
    strict_transitions: bool,
    advance_percent: u8,
}

#[derive(Serialize)]
struct AdminStatusResponse {
    name: String,
    counts: StoreCounts,
    database_open: bool,
    rate_limited_clients: usize,
    uptime_secs: u64,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    let booking = &state.config.booking;
    Json(ServerInfoResponse {
        name: state.config.site_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        initial_booking_status: booking.initial_status,
        strict_transitions: booking.strict_transitions,
        advance_percent: booking.advance_percent,
    })
}

fn verify_admin_token(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ServerError> {
    let Some(ref expected) = config.admin_token else {
        return Err(ServerError::Forbidden(
            "Admin API is disabled (no ADMIN_TOKEN configured)".into(),
        ));
    };

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or(auth);

    use subtle::ConstantTimeEq;
    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    if token_bytes.len() != expected_bytes.len()
        || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
    {
        return Err(ServerError::Forbidden("Invalid admin token".into()));
    }

    Ok(())
}

async fn admin_status(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<AdminStatusResponse>, ServerError> {
    verify_admin_token(&headers, &state.config)?;

    let counts = state.db.run(|db| Ok(db.counts()?)).await?;

    Ok(Json(AdminStatusResponse {
        name: state.config.site_name.clone(),
        counts,
        database_open: state.db.is_open(),
        rate_limited_clients: state.rate_limiter.tracked_clients().await,
        uptime_secs: state.started_at.elapsed().as_secs(),
    }))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
