use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_GUESTS;
use crate::error::DomainError;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Account role. Gates which mutations a user may perform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Guest,
    Host,
    Agent,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Host => "host",
            Self::Agent => "agent",
            Self::Admin => "admin",
        }
    }

    /// Hosts and admins may register listings.
    pub fn can_host(&self) -> bool {
        matches!(self, Self::Host | Self::Admin)
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Self::Guest),
            "host" => Ok(Self::Host),
            "agent" => Ok(Self::Agent),
            "admin" => Ok(Self::Admin),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// How a property prices its rooms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PricingMode {
    #[serde(rename = "perRoom")]
    PerRoom,
    #[serde(rename = "perPerson")]
    PerPerson,
}

impl PricingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerRoom => "perRoom",
            Self::PerPerson => "perPerson",
        }
    }
}

impl FromStr for PricingMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "perRoom" => Ok(Self::PerRoom),
            "perPerson" => Ok(Self::PerPerson),
            other => Err(DomainError::InvalidPricingMode(other.to_string())),
        }
    }
}

/// Room-level rates. The variant must agree with the owning property's
/// [`PricingMode`]; see [`RoomPricing::ensure_matches`].
///
/// Missing rate fields deserialize to zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode")]
pub enum RoomPricing {
    #[serde(rename = "perRoom")]
    PerRoom {
        /// Flat nightly rate for the room.
        #[serde(default)]
        room_rate: u64,
        /// Chargeable guests covered by `room_rate`.
        #[serde(default)]
        base_occupancy: u32,
        /// Nightly surcharge per chargeable guest above `base_occupancy`.
        #[serde(default)]
        extra_person_charge: u64,
    },
    #[serde(rename = "perPerson")]
    PerPerson {
        #[serde(default)]
        adult_rate: u64,
        /// Nightly rate for an older child. Half the adult rate when unset.
        #[serde(default)]
        child_rate: Option<u64>,
    },
}

impl RoomPricing {
    pub fn mode(&self) -> PricingMode {
        match self {
            Self::PerRoom { .. } => PricingMode::PerRoom,
            Self::PerPerson { .. } => PricingMode::PerPerson,
        }
    }

    /// Reject pricing whose shape disagrees with the property's mode.
    pub fn ensure_matches(&self, property_mode: PricingMode) -> Result<(), DomainError> {
        let room = self.mode();
        if room != property_mode {
            return Err(DomainError::PricingModeMismatch {
                property: property_mode,
                room,
            });
        }
        Ok(())
    }

    /// The headline nightly rate: room rate or adult rate.
    pub fn headline_rate(&self) -> u64 {
        match self {
            Self::PerRoom { room_rate, .. } => *room_rate,
            Self::PerPerson { adult_rate, .. } => *adult_rate,
        }
    }
}

// ---------------------------------------------------------------------------
// Guests
// ---------------------------------------------------------------------------

/// Party composition for a stay.
///
/// Younger children (about 0–5) stay free and never count towards capacity
/// surcharges. Older children (about 6–10) are charged as children.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuestComposition {
    pub adults: u32,
    #[serde(default)]
    pub younger_children: u32,
    #[serde(default)]
    pub older_children: u32,
}

impl GuestComposition {
    pub fn new(adults: u32, younger_children: u32, older_children: u32) -> Self {
        Self {
            adults,
            younger_children,
            older_children,
        }
    }

    /// Guests that count towards the room's base occupancy.
    pub fn chargeable(&self) -> u32 {
        self.adults.saturating_add(self.older_children)
    }

    pub fn total(&self) -> u32 {
        self.chargeable().saturating_add(self.younger_children)
    }

    /// Reject an empty party or one larger than [`MAX_GUESTS`].
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.adults == 0 {
            return Err(DomainError::NoAdults);
        }
        let total = self.total();
        if total > MAX_GUESTS {
            return Err(DomainError::TooManyGuests {
                total,
                max: MAX_GUESTS,
            });
        }
        Ok(())
    }
}

/// Contact details for a guest who may not have an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuestContact {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Declared room capacity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Capacity {
    #[serde(default)]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub total: u32,
}

/// Postal address of a property.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

/// Derive a URL slug from a property name: lowercase ASCII alphanumeric
/// words joined by `-`.
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_variant_tags_follow_property_mode_names() {
        let json = serde_json::json!({ "mode": "perPerson", "adult_rate": 800 });
        let pricing: RoomPricing = serde_json::from_value(json).unwrap();
        assert_eq!(
            pricing,
            RoomPricing::PerPerson {
                adult_rate: 800,
                child_rate: None
            }
        );
        assert_eq!(pricing.mode(), PricingMode::PerPerson);
    }

    #[test]
    fn missing_rates_default_to_zero() {
        let json = serde_json::json!({ "mode": "perRoom" });
        let pricing: RoomPricing = serde_json::from_value(json).unwrap();
        assert_eq!(pricing.headline_rate(), 0);
    }

    #[test]
    fn mismatched_pricing_is_rejected() {
        let pricing = RoomPricing::PerRoom {
            room_rate: 1000,
            base_occupancy: 2,
            extra_person_charge: 0,
        };
        assert!(pricing.ensure_matches(PricingMode::PerRoom).is_ok());
        assert_eq!(
            pricing.ensure_matches(PricingMode::PerPerson),
            Err(DomainError::PricingModeMismatch {
                property: PricingMode::PerPerson,
                room: PricingMode::PerRoom,
            })
        );
    }

    #[test]
    fn role_parsing() {
        assert_eq!("host".parse::<UserRole>().unwrap(), UserRole::Host);
        assert!("owner".parse::<UserRole>().is_err());
        assert!(UserRole::Admin.can_host());
        assert!(!UserRole::Guest.can_host());
    }

    #[test]
    fn slug_from_name() {
        assert_eq!(slugify("Lakeview Retreat"), "lakeview-retreat");
        assert_eq!(slugify("  Sea & Sand -- Villas! "), "sea-sand-villas");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn younger_children_are_not_chargeable() {
        let guests = GuestComposition::new(2, 1, 1);
        assert_eq!(guests.chargeable(), 3);
        assert_eq!(guests.total(), 4);
    }

    #[test]
    fn party_size_is_bounded() {
        assert!(GuestComposition::new(2, 1, 1).validate().is_ok());
        assert_eq!(
            GuestComposition::new(0, 2, 0).validate(),
            Err(DomainError::NoAdults)
        );
        assert_eq!(
            GuestComposition::new(MAX_GUESTS, 1, 0).validate(),
            Err(DomainError::TooManyGuests {
                total: MAX_GUESTS + 1,
                max: MAX_GUESTS,
            })
        );

        let huge = GuestComposition::new(u32::MAX, 0, 1);
        assert_eq!(huge.total(), u32::MAX);
        assert!(matches!(
            huge.validate(),
            Err(DomainError::TooManyGuests { .. })
        ));
    }
}
