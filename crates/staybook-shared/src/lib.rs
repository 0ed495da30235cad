//! # staybook-shared
//!
//! Pure domain logic shared by the store and the HTTP server: pricing,
//! availability intervals, the booking lifecycle, and booking references.
//! Nothing in this crate performs I/O.

pub mod availability;
pub mod constants;
pub mod error;
pub mod lifecycle;
pub mod pricing;
pub mod reference;
pub mod types;

pub use availability::DateRange;
pub use error::DomainError;
pub use lifecycle::{BookingStatus, HistoryAction};
pub use pricing::{compute_price, AdvancePolicy, PriceBreakdown};
pub use types::*;
