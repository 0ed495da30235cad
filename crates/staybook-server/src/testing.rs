//! Fixtures for the server's unit tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use tower::ServiceExt;
use uuid::Uuid;

use staybook_shared::constants::IDENTITY_HEADER;
use staybook_shared::{slugify, Address, Capacity, PricingMode, RoomPricing, UserRole};
use staybook_store::{Database, Property, Room, User};

use crate::api::{build_router, AppState};
use crate::config::ServerConfig;
use crate::db::{DbLocation, SharedDb};

pub fn user(role: UserRole) -> User {
    User {
        id: Uuid::new_v4(),
        name: format!("{role} user"),
        email: None,
        phone: Some("+91 99999 00000".into()),
        role,
        created_at: Utc::now(),
    }
}

pub fn seed_user(db: &Database, role: UserRole, email: Option<&str>) -> User {
    let mut u = user(role);
    u.email = email.map(String::from);
    db.create_user(&u).unwrap();
    u
}

pub fn property_value(host_id: Uuid, name: &str, mode: PricingMode) -> Property {
    Property {
        id: Uuid::new_v4(),
        host_id,
        name: name.into(),
        address: Address {
            city: "Ooty".into(),
            country: "IN".into(),
            ..Address::default()
        },
        pricing_mode: mode,
        pricing_value: None,
        slug: slugify(name),
        total_rooms: 3,
        is_active: true,
        is_verified: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn seed_property(db: &Database, host_id: Uuid, name: &str, mode: PricingMode) -> Property {
    let property = property_value(host_id, name, mode);
    db.create_property(&property).unwrap();
    property
}

pub fn flat_pricing(room_rate: u64, base_occupancy: u32, extra_person_charge: u64) -> RoomPricing {
    RoomPricing::PerRoom {
        room_rate,
        base_occupancy,
        extra_person_charge,
    }
}

pub fn seed_room(db: &Database, property: &Property, number: &str, pricing: RoomPricing) -> Room {
    let room = Room {
        id: Uuid::new_v4(),
        property_id: property.id,
        category: "Deluxe".into(),
        room_number: number.into(),
        capacity: Capacity {
            adults: 2,
            children: 2,
            total: 4,
        },
        pricing,
        advance_amount: None,
        amenities: vec!["wifi".into()],
        images: Vec::new(),
        is_active: true,
        is_available: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    db.create_room(&room).unwrap();
    room
}

/// A router over a fresh in-memory database.
pub fn app(config: ServerConfig) -> (Router, AppState) {
    let state = AppState::new(Arc::new(SharedDb::new(DbLocation::Memory)), config);
    (build_router(state.clone()), state)
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, body)
}

/// Issue a JSON request, optionally as `actor`.
pub async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    actor: Option<Uuid>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = actor {
        builder = builder.header(IDENTITY_HEADER, id.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(app, request).await
}
