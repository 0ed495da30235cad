//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use staybook_shared::{
    Address, BookingStatus, Capacity, DateRange, GuestComposition, GuestContact, HistoryAction,
    PriceBreakdown, PricingMode, RoomPricing, UserRole,
};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An account. The role gates which operations the user may perform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Stored lowercased; unique when present.
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Property
// ---------------------------------------------------------------------------

/// A host's listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Property {
    pub id: Uuid,
    /// The host user that owns this listing.
    pub host_id: Uuid,
    pub name: String,
    pub address: Address,
    /// Decides which [`RoomPricing`] variant its rooms carry.
    pub pricing_mode: PricingMode,
    /// Optional flat value shown alongside the listing.
    pub pricing_value: Option<u64>,
    /// Globally unique, used in public URLs.
    pub slug: String,
    /// Number of rooms the host declared at onboarding.
    pub total_rooms: u32,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// A bookable unit inside a property.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    pub id: Uuid,
    pub property_id: Uuid,
    /// Category label, e.g. "Deluxe".
    pub category: String,
    /// Unique within (property, category).
    pub room_number: String,
    pub capacity: Capacity,
    pub pricing: RoomPricing,
    /// Flat advance collected at booking time, overriding the percentage.
    pub advance_amount: Option<u64>,
    pub amenities: Vec<String>,
    /// Opaque image URLs.
    pub images: Vec<String>,
    pub is_active: bool,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Whether guests may book this room at all.
    pub fn is_bookable(&self) -> bool {
        self.is_active && self.is_available
    }
}

// ---------------------------------------------------------------------------
// Booking
// ---------------------------------------------------------------------------

/// One entry of a booking's append-only audit log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub action: HistoryAction,
    /// Status of the booking after this action.
    pub status: BookingStatus,
    /// Acting user; `None` for anonymous guests.
    pub performed_by: Option<Uuid>,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

/// One guest party's reservation of one room for one contiguous stay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Booking {
    pub id: Uuid,
    /// Human-readable reference, see `staybook_shared::reference`.
    pub reference: String,
    pub property_id: Uuid,
    pub room_id: Uuid,
    /// Registered user who made the booking, if any.
    pub user_id: Option<Uuid>,
    pub guest: GuestContact,
    #[serde(flatten)]
    pub stay: DateRange,
    pub guests: GuestComposition,
    pub price: PriceBreakdown,
    pub status: BookingStatus,
    pub special_requests: Option<String>,
    /// Oldest first.
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row counts reported by the admin status endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreCounts {
    pub users: u64,
    pub properties: u64,
    pub rooms: u64,
    pub bookings: u64,
}
