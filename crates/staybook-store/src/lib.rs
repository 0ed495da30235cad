//! # staybook-store
//!
//! Persistent storage for the booking service, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for users,
//! properties, rooms and bookings. The "one active booking per room per
//! night" invariant is enforced inside the database by triggers, so no
//! caller can bypass it.

pub mod bookings;
pub mod database;
pub mod migrations;
pub mod models;
pub mod properties;
pub mod rooms;
pub mod users;

mod codec;
mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;

#[cfg(test)]
pub(crate) mod fixtures;
