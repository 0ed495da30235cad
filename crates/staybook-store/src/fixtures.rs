//! Test fixtures shared by the CRUD modules.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use staybook_shared::{
    Address, BookingStatus, Capacity, DateRange, GuestComposition, GuestContact, HistoryAction,
    PriceBreakdown, PricingMode, RoomPricing, UserRole,
};

use crate::database::Database;
use crate::models::{Booking, HistoryEntry, Property, Room, User};

/// Fixed, millisecond-aligned timestamp so stored rows compare equal.
pub fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap()
}

fn user(role: UserRole, name: &str) -> User {
    User {
        id: Uuid::new_v4(),
        name: name.into(),
        email: None,
        phone: Some("+91 98765 43210".into()),
        role,
        created_at: ts(),
    }
}

pub fn host(db: &Database) -> User {
    let host = user(UserRole::Host, "Meera Host");
    db.create_user(&host).unwrap();
    host
}

pub fn guest(db: &Database) -> User {
    let guest = user(UserRole::Guest, "Ravi Guest");
    db.create_user(&guest).unwrap();
    guest
}

pub fn property_value(host_id: Uuid, name: &str, mode: PricingMode) -> Property {
    Property {
        id: Uuid::new_v4(),
        host_id,
        name: name.into(),
        address: Address {
            line1: "1 Lake Road".into(),
            line2: None,
            city: "Kodaikanal".into(),
            state: "Tamil Nadu".into(),
            postal_code: "624101".into(),
            country: "IN".into(),
        },
        pricing_mode: mode,
        pricing_value: None,
        slug: staybook_shared::slugify(name),
        total_rooms: 4,
        is_active: true,
        is_verified: false,
        created_at: ts(),
        updated_at: ts(),
    }
}

pub fn property(db: &Database, host_id: Uuid, name: &str, mode: PricingMode) -> Property {
    let property = property_value(host_id, name, mode);
    db.create_property(&property).unwrap();
    property
}

pub fn room_value(property: &Property, number: &str) -> Room {
    let pricing = match property.pricing_mode {
        PricingMode::PerRoom => RoomPricing::PerRoom {
            room_rate: 1000,
            base_occupancy: 2,
            extra_person_charge: 500,
        },
        PricingMode::PerPerson => RoomPricing::PerPerson {
            adult_rate: 800,
            child_rate: None,
        },
    };
    Room {
        id: Uuid::new_v4(),
        property_id: property.id,
        category: "Deluxe".into(),
        room_number: number.into(),
        capacity: Capacity {
            adults: 2,
            children: 1,
            total: 3,
        },
        pricing,
        advance_amount: None,
        amenities: Vec::new(),
        images: Vec::new(),
        is_active: true,
        is_available: true,
        created_at: ts(),
        updated_at: ts(),
    }
}

pub fn room(db: &Database, property: &Property, number: &str) -> Room {
    let room = room_value(property, number);
    db.create_room(&room).unwrap();
    room
}

pub fn entry(action: HistoryAction, status: BookingStatus) -> HistoryEntry {
    HistoryEntry {
        action,
        status,
        performed_by: None,
        details: String::new(),
        timestamp: ts(),
    }
}

pub fn booking(room: &Room, check_in: &str, check_out: &str, status: BookingStatus) -> Booking {
    let id = Uuid::new_v4();
    Booking {
        id,
        reference: format!("REF-{id}"),
        property_id: room.property_id,
        room_id: room.id,
        user_id: None,
        guest: GuestContact {
            name: "Walk In".into(),
            phone: "+91 90000 11111".into(),
            email: None,
        },
        stay: DateRange::parse(check_in, check_out).unwrap(),
        guests: GuestComposition::new(2, 0, 0),
        price: PriceBreakdown {
            rate: 1000,
            nights: 1,
            total_amount: 1000,
            advance_amount: 500,
            balance_amount: 500,
        },
        status,
        special_requests: None,
        history: vec![entry(HistoryAction::Created, status)],
        created_at: ts(),
        updated_at: ts(),
    }
}
