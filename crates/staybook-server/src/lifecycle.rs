//! Booking status changes made by hosts and admins.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use staybook_shared::{BookingStatus, HistoryAction};
use staybook_store::{Booking, Database, HistoryEntry};

use crate::actor::Actor;
use crate::config::BookingPolicy;
use crate::error::ServerError;

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChangeRequest {
    pub status: String,
    #[serde(default)]
    pub details: Option<String>,
}

/// Move `booking_id` to the requested status on behalf of `actor`.
///
/// Only the host owning the booked room's property, or an admin, may do
/// this. With a strict policy the move must follow the transition table.
pub fn change_status(
    db: &mut Database,
    policy: &BookingPolicy,
    actor: &Actor,
    booking_id: Uuid,
    req: StatusChangeRequest,
    now: DateTime<Utc>,
) -> Result<Booking, ServerError> {
    let next: BookingStatus = req.status.trim().parse()?;

    let booking = db
        .get_booking(booking_id)
        .map_err(ServerError::from_store("booking"))?;
    let room = db
        .get_room(booking.room_id)
        .map_err(ServerError::from_store("room"))?;
    let property = db
        .get_property(room.property_id)
        .map_err(ServerError::from_store("property"))?;

    if let Err(e) = actor.ensure_can_manage(&property) {
        warn!(
            booking_id = %booking.id,
            actor = %actor.id,
            "Rejected status change by non-owner"
        );
        return Err(e);
    }

    let current = booking.status;
    if policy.strict_transitions && !current.can_transition_to(next) {
        return Err(ServerError::Conflict(format!(
            "cannot move booking from {current} to {next}"
        )));
    }

    let details = req
        .details
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("Status changed from {current} to {next}"));

    let entry = HistoryEntry {
        action: HistoryAction::for_transition(next),
        status: next,
        performed_by: Some(actor.id),
        details,
        timestamp: now,
    };

    let updated = db.transition_booking(booking.id, current, &entry)?;
    info!(
        booking_id = %updated.id,
        from = %current,
        to = %next,
        actor = %actor.id,
        "Booking status changed"
    );
    Ok(updated)
}
