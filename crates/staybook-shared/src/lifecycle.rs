//! Booking status state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Closed set of booking statuses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
    NoShow,
    Declined,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 7] = [
        Self::Pending,
        Self::Confirmed,
        Self::CheckedIn,
        Self::CheckedOut,
        Self::Cancelled,
        Self::NoShow,
        Self::Declined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::CheckedIn => "checked-in",
            Self::CheckedOut => "checked-out",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no-show",
            Self::Declined => "declined",
        }
    }

    /// Cancelled and declined bookings release their room. Every other
    /// status, `pending` included, holds it.
    pub fn holds_room(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Declined)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::CheckedOut | Self::Cancelled | Self::NoShow | Self::Declined
        )
    }

    /// Statuses a new booking may start in.
    pub fn is_initial(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Strict transition table.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        match self {
            Pending => matches!(next, Confirmed | Declined | Cancelled),
            Confirmed => matches!(next, CheckedIn | NoShow | Cancelled),
            CheckedIn => matches!(next, CheckedOut | Cancelled),
            CheckedOut | Cancelled | NoShow | Declined => false,
        }
    }
}

impl FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::InvalidStatus(s.to_string()))
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of entry in a booking's history log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Created,
    Modified,
    Cancelled,
}

impl HistoryAction {
    /// Classify a status change: cancellations and declines are logged as
    /// `cancelled`, everything else as `modified`.
    pub fn for_transition(next: BookingStatus) -> Self {
        match next {
            BookingStatus::Cancelled | BookingStatus::Declined => Self::Cancelled,
            _ => Self::Modified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for HistoryAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "modified" => Ok(Self::Modified),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::InvalidHistoryAction(other.to_string())),
        }
    }
}
