//! Booking endpoints: creation, availability, dashboards and status changes.

use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use staybook_store::{Booking, Database};

use crate::actor::{Actor, CurrentActor};
use crate::api::listings::managed_property;
use crate::api::AppState;
use crate::error::ServerError;
use crate::lifecycle::{change_status, StatusChangeRequest};
use crate::reservation::{create_reservation, parse_stay, BookingSummary, ReservationRequest};

pub async fn create_booking(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    payload: Result<Json<ReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingSummary>), ServerError> {
    let Json(req) = payload?;
    let policy = state.config.booking;

    let booking = state
        .db
        .run(move |db| create_reservation(db, &policy, actor.as_ref(), req, Utc::now()))
        .await?;

    Ok((StatusCode::CREATED, Json(BookingSummary::from(&booking))))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub check_in: Option<String>,
    pub check_out: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub room_id: Uuid,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub nights: u32,
    pub available: bool,
}

pub async fn room_availability(
    State(state): State<AppState>,
    room_id: Result<Path<Uuid>, PathRejection>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ServerError> {
    let Path(room_id) = room_id?;
    let (Some(check_in), Some(check_out)) = (query.check_in, query.check_out) else {
        return Err(ServerError::Validation(
            "check_in and check_out are required".into(),
        ));
    };
    let stay = parse_stay(&check_in, &check_out)?;

    let available = state
        .db
        .run(move |db| {
            let room = db.get_room(room_id).map_err(ServerError::from_store("room"))?;
            Ok(room.is_bookable() && !db.has_conflict(room.id, &stay)?)
        })
        .await?;

    Ok(Json(AvailabilityResponse {
        room_id,
        check_in: stay.check_in,
        check_out: stay.check_out,
        nights: stay.nights(),
        available,
    }))
}

pub async fn get_booking(
    State(state): State<AppState>,
    actor: CurrentActor,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Booking>, ServerError> {
    let Path(id) = id?;
    let actor = actor.require()?;

    let booking = state
        .db
        .run(move |db| {
            let booking = db.get_booking(id).map_err(ServerError::from_store("booking"))?;
            if booking.user_id == Some(actor.id) || actor.is_admin() || same_email(&actor, &booking) {
                return Ok(booking);
            }
            let property = db
                .get_property(booking.property_id)
                .map_err(ServerError::from_store("property"))?;
            actor.ensure_can_manage(&property)?;
            Ok(booking)
        })
        .await?;

    Ok(Json(booking))
}

/// An anonymous booking made with the actor's email address.
fn same_email(actor: &Actor, booking: &Booking) -> bool {
    match (&actor.email, &booking.guest.email) {
        (Some(mine), Some(theirs)) => mine.eq_ignore_ascii_case(theirs),
        _ => false,
    }
}

/// Room label shown next to each booking on the host dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct RoomLabel {
    pub category: String,
    pub room_number: String,
}

#[derive(Debug, Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    /// `None` when the room could not be loaded.
    pub room: Option<RoomLabel>,
}

/// Attach room labels. A failed room lookup is logged and the booking is
/// returned without one.
fn enrich(db: &Database, bookings: Vec<Booking>) -> Vec<BookingView> {
    let mut labels: HashMap<Uuid, Option<RoomLabel>> = HashMap::new();
    bookings
        .into_iter()
        .map(|booking| {
            let room = labels
                .entry(booking.room_id)
                .or_insert_with(|| match db.get_room(booking.room_id) {
                    Ok(room) => Some(RoomLabel {
                        category: room.category,
                        room_number: room.room_number,
                    }),
                    Err(e) => {
                        warn!(
                            booking_id = %booking.id,
                            room_id = %booking.room_id,
                            error = %e,
                            "Room lookup failed, returning booking without room detail"
                        );
                        None
                    }
                })
                .clone();
            BookingView { booking, room }
        })
        .collect()
}

pub async fn property_bookings(
    State(state): State<AppState>,
    actor: CurrentActor,
    property_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<BookingView>>, ServerError> {
    let Path(property_id) = property_id?;
    let actor = actor.require()?;

    let views = state
        .db
        .run(move |db| {
            let property = managed_property(db, &actor, property_id)?;
            let bookings = db.list_bookings_for_property(property.id)?;
            Ok(enrich(db, bookings))
        })
        .await?;

    Ok(Json(views))
}

pub async fn my_bookings(
    State(state): State<AppState>,
    actor: CurrentActor,
) -> Result<Json<Vec<BookingView>>, ServerError> {
    let actor = actor.require()?;

    let views = state
        .db
        .run(move |db| {
            let bookings = db.list_bookings_for_user(actor.id)?;
            Ok(enrich(db, bookings))
        })
        .await?;

    Ok(Json(views))
}

pub async fn change_booking_status(
    State(state): State<AppState>,
    actor: CurrentActor,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StatusChangeRequest>, JsonRejection>,
) -> Result<Json<Booking>, ServerError> {
    let Path(id) = id?;
    let actor = actor.require()?;
    let Json(req) = payload?;
    let policy = state.config.booking;

    let booking = state
        .db
        .run(move |db| change_status(db, &policy, &actor, id, req, Utc::now()))
        .await?;

    Ok(Json(booking))
}
