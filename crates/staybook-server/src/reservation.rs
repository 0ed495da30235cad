//! Reservation creation flow.
//!
//! Validates a guest's submission, checks the room is free, prices the stay
//! and persists the booking. The availability check here only produces a
//! friendly early error; the authoritative check runs again inside the
//! store's insert transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use staybook_shared::availability::parse_stay_date;
use staybook_shared::reference::booking_reference;
use staybook_shared::{
    AdvancePolicy, BookingStatus, DateRange, DomainError, GuestComposition, GuestContact,
    HistoryAction, PriceBreakdown,
};
use staybook_store::{Booking, Database, HistoryEntry, StoreError};

use crate::actor::Actor;
use crate::config::BookingPolicy;
use crate::error::ServerError;

/// Attempts at finding an unused booking reference.
const MAX_REFERENCE_ATTEMPTS: i64 = 5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuestInput {
    #[serde(default, alias = "full_name")]
    pub name: Option<String>,
    #[serde(default, alias = "mobile")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A booking submission. Everything is optional at the wire level so that
/// missing fields surface as validation errors rather than parse failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationRequest {
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub check_in: Option<String>,
    #[serde(default)]
    pub check_out: Option<String>,
    #[serde(default, alias = "guest_info")]
    pub guest: GuestInput,
    #[serde(default)]
    pub adults: Option<u32>,
    #[serde(default)]
    pub younger_children: u32,
    #[serde(default)]
    pub older_children: u32,
    #[serde(default)]
    pub special_requests: Option<String>,
}

/// What the caller gets back after a successful submission.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BookingSummary {
    pub id: Uuid,
    pub reference: String,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub status: BookingStatus,
    pub guest_name: String,
    pub guest_phone: String,
    pub total_amount: u64,
}

impl From<&Booking> for BookingSummary {
    fn from(b: &Booking) -> Self {
        Self {
            id: b.id,
            reference: b.reference.clone(),
            check_in: b.stay.check_in,
            check_out: b.stay.check_out,
            status: b.status,
            guest_name: b.guest.name.clone(),
            guest_phone: b.guest.phone.clone(),
            total_amount: b.price.total_amount,
        }
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ServerError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServerError::Validation(format!("{field} is required")))
}

fn parse_id(raw: &str, field: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(raw).map_err(|_| ServerError::Validation(format!("invalid {field}")))
}

/// Parse both stay dates, rejecting an empty or inverted range.
pub fn parse_stay(check_in: &str, check_out: &str) -> Result<DateRange, ServerError> {
    let check_in = parse_stay_date(check_in)?;
    let check_out = parse_stay_date(check_out)?;
    DateRange::new(check_in, check_out).map_err(|e| match e {
        DomainError::EmptyDateRange => {
            ServerError::Validation("invalid date range: check-out must be after check-in".into())
        }
        other => other.into(),
    })
}

/// Create a booking.
///
/// `now` drives timestamps and the booking reference.
pub fn create_reservation(
    db: &mut Database,
    policy: &BookingPolicy,
    actor: Option<&Actor>,
    req: ReservationRequest,
    now: DateTime<Utc>,
) -> Result<Booking, ServerError> {
    // 1. Presence.
    let property_id = required(req.property_id, "property id")?;
    let room_id = required(req.room_id, "room id")?;
    let check_in = required(req.check_in, "check-in date")?;
    let check_out = required(req.check_out, "check-out date")?;
    let guest_name = required(req.guest.name, "guest name")?;
    let guest_phone = required(req.guest.phone, "guest phone")?;
    let guest_email = req
        .guest
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());

    let property_id = parse_id(&property_id, "property id")?;
    let room_id = parse_id(&room_id, "room id")?;

    let guests = GuestComposition::new(
        req.adults.unwrap_or(1),
        req.younger_children,
        req.older_children,
    );
    guests.validate()?;

    // 2–3. Room and property.
    let room = db.get_room(room_id).map_err(ServerError::from_store("room"))?;
    if !room.is_active {
        return Err(ServerError::not_found("room"));
    }
    let property = db
        .get_property(property_id)
        .map_err(ServerError::from_store("property"))?;
    if !property.is_active {
        return Err(ServerError::not_found("property"));
    }
    if room.property_id != property.id {
        return Err(ServerError::Validation(
            "room does not belong to this property".into(),
        ));
    }
    if !room.is_available {
        return Err(ServerError::Conflict("room unavailable".into()));
    }

    // 4. Dates.
    let stay = parse_stay(&check_in, &check_out)?;

    // 5. Availability.
    if db.has_conflict(room.id, &stay)? {
        warn!(room_id = %room.id, check_in = %stay.check_in, "Rejected overlapping booking");
        return Err(ServerError::Conflict("room unavailable".into()));
    }

    // 6. Acting identity.
    let user_id = match (actor, guest_email.as_deref()) {
        (Some(actor), _) => Some(actor.id),
        (None, Some(email)) => db.find_user_by_email(email)?.map(|u| u.id),
        (None, None) => None,
    };

    // 7. Price.
    let advance = AdvancePolicy::resolve(room.advance_amount, policy.advance_percent);
    let price = PriceBreakdown::quote(&room.pricing, stay.nights(), &guests, advance)?;

    // 8–9. Reference and persistence.
    let mut booking = Booking {
        id: Uuid::new_v4(),
        reference: String::new(),
        property_id: property.id,
        room_id: room.id,
        user_id,
        guest: GuestContact {
            name: guest_name,
            phone: guest_phone,
            email: guest_email,
        },
        stay,
        guests,
        price,
        status: policy.initial_status,
        special_requests: req
            .special_requests
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        history: vec![HistoryEntry {
            action: HistoryAction::Created,
            status: policy.initial_status,
            performed_by: user_id,
            details: "Booking created".into(),
            timestamp: now,
        }],
        created_at: now,
        updated_at: now,
    };

    let millis = now.timestamp_millis();
    for attempt in 0..MAX_REFERENCE_ATTEMPTS {
        booking.reference = booking_reference(millis + attempt, &property.name);
        match db.insert_booking(&booking) {
            Ok(()) => {
                info!(
                    booking_id = %booking.id,
                    reference = %booking.reference,
                    room_id = %booking.room_id,
                    status = %booking.status,
                    total = booking.price.total_amount,
                    "Booking created"
                );
                return Ok(booking);
            }
            Err(StoreError::Duplicate(ref field)) if field == "bookings.reference" => {
                warn!(reference = %booking.reference, "Booking reference taken, retrying");
            }
            Err(StoreError::Overlap) => {
                warn!(room_id = %booking.room_id, "Overlap detected at insert");
                return Err(ServerError::Conflict("room unavailable".into()));
            }
            Err(other) => return Err(other.into()),
        }
    }

    Err(ServerError::Internal(
        "could not allocate a unique booking reference".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use chrono::TimeZone;
    use staybook_shared::constants::MAX_GUESTS;
    use staybook_shared::{PricingMode, RoomPricing, UserRole};
    use staybook_store::{Property, Room};

    struct Setup {
        db: Database,
        property: Property,
        room: Room,
    }

    fn setup(pricing: RoomPricing) -> Setup {
        let db = Database::open_in_memory().unwrap();
        let host = testing::seed_user(&db, UserRole::Host, Some("host@stay.test"));
        let property = testing::seed_property(&db, host.id, "Lakeview Retreat", pricing.mode());
        let room = testing::seed_room(&db, &property, "101", pricing);
        Setup { db, property, room }
    }

    fn request(s: &Setup, check_in: &str, check_out: &str) -> ReservationRequest {
        ReservationRequest {
            property_id: Some(s.property.id.to_string()),
            room_id: Some(s.room.id.to_string()),
            check_in: Some(check_in.into()),
            check_out: Some(check_out.into()),
            guest: GuestInput {
                name: Some("Priya".into()),
                phone: Some("+91 90000 12345".into()),
                email: None,
            },
            adults: Some(2),
            ..ReservationRequest::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_735_689_600_123).unwrap()
    }

    fn create(s: &mut Setup, req: ReservationRequest) -> Result<Booking, ServerError> {
        create_reservation(&mut s.db, &BookingPolicy::default(), None, req, now())
    }

    fn book(s: &mut Setup, check_in: &str, check_out: &str) -> Result<Booking, ServerError> {
        let req = request(s, check_in, check_out);
        create(s, req)
    }

    #[test]
    fn creates_pending_booking_with_reference_and_history() {
        let mut s = setup(testing::flat_pricing(1000, 2, 500));
        let booking = book(&mut s, "2025-03-01", "2025-03-03").unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.reference, "FRA-BE-89600123-LAKEVI-BOOKING");
        assert_eq!(booking.price.nights, 2);
        assert_eq!(booking.price.total_amount, 2000);
        assert_eq!(booking.price.advance_amount, 1000);
        assert_eq!(booking.price.balance_amount, 1000);
        assert_eq!(booking.user_id, None);
        assert_eq!(booking.history.len(), 1);
        assert_eq!(booking.history[0].action, HistoryAction::Created);
        assert_eq!(booking.history[0].performed_by, None);

        let stored = s.db.get_booking(booking.id).unwrap();
        assert_eq!(stored, booking);

        let summary = BookingSummary::from(&booking);
        assert_eq!(summary.guest_name, "Priya");
        assert_eq!(summary.total_amount, 2000);
    }

    #[test]
    fn extra_adult_is_surcharged() {
        let mut s = setup(testing::flat_pricing(1000, 2, 500));
        let mut req = request(&s, "2025-03-01", "2025-03-03");
        req.adults = Some(3);
        let booking = create(&mut s, req).unwrap();
        assert_eq!(booking.price.total_amount, 3000);
    }

    #[test]
    fn per_person_child_rate_defaults_to_half() {
        let mut s = setup(RoomPricing::PerPerson {
            adult_rate: 800,
            child_rate: None,
        });
        let mut req = request(&s, "2025-03-01", "2025-03-02");
        req.older_children = 1;
        req.younger_children = 2;
        let booking = create(&mut s, req).unwrap();
        assert_eq!(booking.price.total_amount, 2000);
        assert_eq!(booking.price.rate, 800);
    }

    #[test]
    fn room_flat_advance_overrides_percentage() {
        let mut s = setup(testing::flat_pricing(1000, 2, 0));
        let mut room = s.room.clone();
        room.advance_amount = Some(300);
        s.db.update_room(&room).unwrap();

        let booking = book(&mut s, "2025-03-01", "2025-03-04").unwrap();
        assert_eq!(booking.price.total_amount, 3000);
        assert_eq!(booking.price.advance_amount, 300);
        assert_eq!(booking.price.balance_amount, 2700);
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        let mut s = setup(testing::flat_pricing(1000, 2, 0));

        let mut req = request(&s, "2025-03-01", "2025-03-02");
        req.guest.phone = None;
        assert!(matches!(create(&mut s, req), Err(ServerError::Validation(ref m)) if m.contains("guest phone")));

        let mut req = request(&s, "2025-03-01", "2025-03-02");
        req.guest.name = Some("   ".into());
        assert!(matches!(create(&mut s, req), Err(ServerError::Validation(_))));

        let mut req = request(&s, "2025-03-01", "2025-03-02");
        req.room_id = None;
        assert!(matches!(create(&mut s, req), Err(ServerError::Validation(_))));

        let mut req = request(&s, "2025-03-01", "2025-03-02");
        req.adults = Some(0);
        assert!(matches!(create(&mut s, req), Err(ServerError::Validation(_))));
    }

    #[test]
    fn unknown_room_or_property_is_not_found() {
        let mut s = setup(testing::flat_pricing(1000, 2, 0));

        let mut req = request(&s, "2025-03-01", "2025-03-02");
        req.room_id = Some(Uuid::new_v4().to_string());
        assert!(matches!(create(&mut s, req), Err(ServerError::NotFound(ref w)) if w == "room"));

        let mut req = request(&s, "2025-03-01", "2025-03-02");
        req.property_id = Some(Uuid::new_v4().to_string());
        assert!(matches!(create(&mut s, req), Err(ServerError::NotFound(ref w)) if w == "property"));
    }

    #[test]
    fn room_of_another_property_is_rejected() {
        let mut s = setup(testing::flat_pricing(1000, 2, 0));
        let other = testing::seed_property(&s.db, s.property.host_id, "Other Place", PricingMode::PerRoom);
        let mut req = request(&s, "2025-03-01", "2025-03-02");
        req.property_id = Some(other.id.to_string());
        assert!(matches!(create(&mut s, req), Err(ServerError::Validation(_))));
    }

    #[test]
    fn checkout_must_follow_checkin() {
        let mut s = setup(testing::flat_pricing(1000, 2, 0));
        for (a, b) in [("2025-03-02", "2025-03-02"), ("2025-03-05", "2025-03-01")] {
            let err = book(&mut s, a, b).unwrap_err();
            assert!(matches!(err, ServerError::Validation(ref m) if m.contains("date range")));
        }
        let err = book(&mut s, "soon", "2025-03-01").unwrap_err();
        assert!(matches!(err, ServerError::Validation(_)));
    }

    #[test]
    fn oversized_party_is_rejected() {
        let mut s = setup(testing::flat_pricing(1000, 1, 500));

        let mut req = request(&s, "2025-03-01", "2025-03-02");
        req.adults = Some(u32::MAX);
        req.older_children = 1;
        let err = create(&mut s, req).unwrap_err();
        assert!(matches!(err, ServerError::Validation(ref m) if m.contains("exceeds")));

        let mut req = request(&s, "2025-03-01", "2025-03-02");
        req.adults = Some(MAX_GUESTS);
        req.younger_children = 1;
        assert!(matches!(create(&mut s, req), Err(ServerError::Validation(_))));

        let booking = book(&mut s, "2025-03-01", "2025-03-02").unwrap();
        assert_eq!(booking.price.total_amount, 1500);
    }

    #[test]
    fn unrepresentable_price_is_rejected() {
        let mut s = setup(testing::flat_pricing(u64::MAX / 2, 2, 0));
        let err = book(&mut s, "2025-03-01", "2025-03-04").unwrap_err();
        assert!(matches!(err, ServerError::Validation(ref m) if m.contains("price")));
        assert!(s.db.list_bookings_for_property(s.property.id).unwrap().is_empty());
    }

    #[test]
    fn dates_outside_storable_years_are_rejected() {
        let mut s = setup(testing::flat_pricing(1000, 2, 0));
        let err = book(&mut s, "+10000-01-01", "+10000-01-02").unwrap_err();
        assert!(matches!(err, ServerError::Validation(ref m) if m.contains("+10000-01-01")));

        let err = book(&mut s, "2025-03-01T10:00:00.0001Z", "2025-03-01T10:00:00.0009Z").unwrap_err();
        assert!(matches!(err, ServerError::Validation(ref m) if m.contains("date range")));

        book(&mut s, "2025-03-01", "2025-03-02").unwrap();
        assert_eq!(s.db.list_bookings_for_property(s.property.id).unwrap().len(), 1);
    }

    #[test]
    fn overlapping_requests_are_rejected() {
        let mut s = setup(testing::flat_pricing(1000, 2, 0));
        book(&mut s, "2025-03-01", "2025-03-05").unwrap();

        let err = book(&mut s, "2025-03-04", "2025-03-08").unwrap_err();
        assert!(matches!(err, ServerError::Conflict(ref m) if m == "room unavailable"));

        // Back-to-back is fine.
        book(&mut s, "2025-03-05", "2025-03-08").unwrap();
    }

    #[test]
    fn same_millisecond_bookings_get_distinct_references() {
        let mut s = setup(testing::flat_pricing(1000, 2, 0));
        let first = book(&mut s, "2025-03-01", "2025-03-02").unwrap();
        let second = book(&mut s, "2025-04-01", "2025-04-02").unwrap();
        assert_ne!(first.reference, second.reference);
        assert_eq!(second.reference, "FRA-BE-89600124-LAKEVI-BOOKING");
    }

    #[test]
    fn actor_is_preferred_then_email_match() {
        let mut s = setup(testing::flat_pricing(1000, 2, 0));
        let guest = testing::seed_user(&s.db, UserRole::Guest, Some("priya@mail.test"));

        let mut req = request(&s, "2025-03-01", "2025-03-02");
        req.guest.email = Some("Priya@Mail.test".into());
        let by_email = create(&mut s, req).unwrap();
        assert_eq!(by_email.user_id, Some(guest.id));
        assert_eq!(by_email.history[0].performed_by, Some(guest.id));

        let agent = testing::seed_user(&s.db, UserRole::Agent, None);
        let actor = Actor::from(&agent);
        let mut req = request(&s, "2025-04-01", "2025-04-02");
        req.guest.email = Some("priya@mail.test".into());
        let by_actor =
            create_reservation(&mut s.db, &BookingPolicy::default(), Some(&actor), req, now())
                .unwrap();
        assert_eq!(by_actor.user_id, Some(agent.id));
    }

    #[test]
    fn initial_status_follows_policy() {
        let mut s = setup(testing::flat_pricing(1000, 2, 0));
        let policy = BookingPolicy {
            initial_status: BookingStatus::Confirmed,
            ..BookingPolicy::default()
        };
        let req = request(&s, "2025-03-01", "2025-03-02");
        let booking = create_reservation(&mut s.db, &policy, None, req, now()).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.history[0].status, BookingStatus::Confirmed);
    }

    #[test]
    fn inactive_or_unavailable_rooms_cannot_be_booked() {
        let mut s = setup(testing::flat_pricing(1000, 2, 0));
        let mut room = s.room.clone();
        room.is_available = false;
        s.db.update_room(&room).unwrap();
        let err = book(&mut s, "2025-03-01", "2025-03-02").unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));

        room.is_active = false;
        s.db.update_room(&room).unwrap();
        let err = book(&mut s, "2025-03-01", "2025-03-02").unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[test]
    fn request_accepts_alternate_guest_field_names() {
        let json = serde_json::json!({
            "property_id": "p",
            "room_id": "r",
            "guest_info": { "full_name": "Anu", "mobile": "123" },
        });
        let req: ReservationRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.guest.name.as_deref(), Some("Anu"));
        assert_eq!(req.guest.phone.as_deref(), Some("123"));
        assert_eq!(req.adults, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_overlapping_requests_admit_exactly_one() {
        use crate::db::{DbLocation, SharedDb};
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let shared = Arc::new(SharedDb::new(DbLocation::Path(dir.path().join("race.db"))));

        let (property, room) = shared
            .with(|db| {
                let host = testing::seed_user(db, UserRole::Host, None);
                let property =
                    testing::seed_property(db, host.id, "Hill View", PricingMode::PerRoom);
                let room = testing::seed_room(db, &property, "1", testing::flat_pricing(900, 2, 0));
                Ok((property, room))
            })
            .unwrap();

        let mut tasks = Vec::new();
        for (i, (check_in, check_out)) in [("2025-06-01", "2025-06-04"), ("2025-06-03", "2025-06-06")]
            .into_iter()
            .enumerate()
        {
            let shared = Arc::clone(&shared);
            let req = ReservationRequest {
                property_id: Some(property.id.to_string()),
                room_id: Some(room.id.to_string()),
                check_in: Some(check_in.into()),
                check_out: Some(check_out.into()),
                guest: GuestInput {
                    name: Some(format!("Guest {i}")),
                    phone: Some("555".into()),
                    email: None,
                },
                ..ReservationRequest::default()
            };
            tasks.push(tokio::spawn(async move {
                shared
                    .run(move |db| {
                        create_reservation(db, &BookingPolicy::default(), None, req, Utc::now())
                    })
                    .await
            }));
        }

        let mut created = 0;
        let mut conflicts = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(ServerError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!((created, conflicts), (1, 1));

        let stored = shared
            .with(|db| Ok(db.list_bookings_for_property(property.id)?))
            .unwrap();
        assert_eq!(stored.len(), 1);

        shared.teardown().unwrap();
    }
}
