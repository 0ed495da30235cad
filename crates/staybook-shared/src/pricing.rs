//! Stay price computation.
//!
//! Two pricing models exist. A `perRoom` room charges a flat nightly rate
//! plus a surcharge for every chargeable guest above its base occupancy. A
//! `perPerson` room charges each adult and older child individually. Younger
//! children are free under both models.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ADVANCE_PERCENT;
use crate::error::DomainError;
use crate::types::{GuestComposition, RoomPricing};

/// Total price of a stay.
///
/// Pure: identical inputs always produce identical output. Fails with
/// [`DomainError::PriceOverflow`] rather than wrapping.
pub fn compute_price(
    pricing: &RoomPricing,
    nights: u32,
    guests: &GuestComposition,
) -> Result<u64, DomainError> {
    let nights = u64::from(nights);
    let nightly = match pricing {
        RoomPricing::PerRoom {
            room_rate,
            base_occupancy,
            extra_person_charge,
        } => {
            let extra_guests = u64::from(guests.chargeable().saturating_sub(*base_occupancy));
            extra_guests
                .checked_mul(*extra_person_charge)
                .and_then(|surcharge| room_rate.checked_add(surcharge))
        }
        RoomPricing::PerPerson {
            adult_rate,
            child_rate,
        } => {
            let child_rate = child_rate.unwrap_or(adult_rate / 2);
            let adults = u64::from(guests.adults).checked_mul(*adult_rate);
            let children = u64::from(guests.older_children).checked_mul(child_rate);
            adults.zip(children).and_then(|(a, c)| a.checked_add(c))
        }
    };
    nightly
        .and_then(|n| n.checked_mul(nights))
        .filter(|total| i64::try_from(*total).is_ok())
        .ok_or(DomainError::PriceOverflow)
}

/// How much of the total is collected up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancePolicy {
    /// A share of the total, rounded down.
    Percent(u8),
    /// A fixed amount, capped at the total.
    Flat(u64),
}

impl Default for AdvancePolicy {
    fn default() -> Self {
        Self::Percent(DEFAULT_ADVANCE_PERCENT)
    }
}

impl AdvancePolicy {
    /// A room-level flat advance wins over the configured percentage.
    pub fn resolve(room_advance: Option<u64>, percent: u8) -> Self {
        match room_advance {
            Some(amount) => Self::Flat(amount),
            None => Self::Percent(percent),
        }
    }

    pub fn advance_for(&self, total: u64) -> u64 {
        match self {
            Self::Percent(p) => {
                let share = u128::from(total) * u128::from((*p).min(100)) / 100;
                u64::try_from(share).unwrap_or(total)
            }
            Self::Flat(amount) => (*amount).min(total),
        }
    }
}

/// Amounts stored on a booking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceBreakdown {
    /// Nightly room rate (`perRoom`) or adult rate (`perPerson`).
    pub rate: u64,
    pub nights: u32,
    pub total_amount: u64,
    pub advance_amount: u64,
    pub balance_amount: u64,
}

impl PriceBreakdown {
    pub fn quote(
        pricing: &RoomPricing,
        nights: u32,
        guests: &GuestComposition,
        advance: AdvancePolicy,
    ) -> Result<Self, DomainError> {
        let total_amount = compute_price(pricing, nights, guests)?;
        let advance_amount = advance.advance_for(total_amount);
        Ok(Self {
            rate: pricing.headline_rate(),
            nights,
            total_amount,
            advance_amount,
            balance_amount: total_amount - advance_amount,
        })
    }
}
