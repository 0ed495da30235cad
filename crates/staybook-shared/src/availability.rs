//! Stay intervals and overlap detection.

use chrono::{DateTime, Datelike, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_STAY_YEAR, MIN_STAY_YEAR, SECONDS_PER_NIGHT};
use crate::error::DomainError;

/// A half-open stay interval `[check_in, check_out)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
}

impl DateRange {
    /// Build a range, rejecting `check_out <= check_in`.
    pub fn new(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> Result<Self, DomainError> {
        if check_out <= check_in {
            return Err(DomainError::EmptyDateRange);
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Parse both ends with [`parse_stay_date`].
    pub fn parse(check_in: &str, check_out: &str) -> Result<Self, DomainError> {
        Self::new(parse_stay_date(check_in)?, parse_stay_date(check_out)?)
    }

    /// Two stays conflict when they share any instant. A stay ending on the
    /// day another begins does not conflict.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.check_in < other.check_out && self.check_out > other.check_in
    }

    /// Billable nights, rounding partial days up.
    pub fn nights(&self) -> u32 {
        let secs = (self.check_out - self.check_in).num_seconds();
        let nights = (secs + SECONDS_PER_NIGHT - 1) / SECONDS_PER_NIGHT;
        u32::try_from(nights).unwrap_or(u32::MAX)
    }
}

/// Accept `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
///
/// The result is truncated to whole milliseconds and must fall in years
/// 0001 to 9999 (UTC), the range stored timestamps can represent.
pub fn parse_stay_date(raw: &str) -> Result<DateTime<Utc>, DomainError> {
    let raw = raw.trim();
    let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
        .ok_or_else(|| DomainError::InvalidDate(raw.to_string()))?;

    if !(MIN_STAY_YEAR..=MAX_STAY_YEAR).contains(&parsed.year()) {
        return Err(DomainError::InvalidDate(raw.to_string()));
    }
    Ok(parsed.trunc_subsecs(3))
}
