use thiserror::Error;

use crate::types::PricingMode;

/// Errors produced while parsing or validating domain values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid booking status: {0}")]
    InvalidStatus(String),

    #[error("Invalid history action: {0}")]
    InvalidHistoryAction(String),

    #[error("Invalid user role: {0}")]
    InvalidRole(String),

    #[error("Invalid pricing mode: {0}")]
    InvalidPricingMode(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Check-out must be after check-in")]
    EmptyDateRange,

    #[error("At least one adult is required")]
    NoAdults,

    #[error("Party of {total} guests exceeds the limit of {max}")]
    TooManyGuests { total: u32, max: u32 },

    #[error("Stay price is out of range")]
    PriceOverflow,

    #[error("Room pricing is {room:?} but property pricing is {property:?}")]
    PricingModeMismatch {
        property: PricingMode,
        room: PricingMode,
    },
}
