/// Application name
pub const APP_NAME: &str = "Staybook";

/// Largest party a single booking may carry, younger children included
pub const MAX_GUESTS: u32 = 50;

/// Stay dates must fall within these calendar years
pub const MIN_STAY_YEAR: i32 = 1;
pub const MAX_STAY_YEAR: i32 = 9999;

/// Fixed prefix of every booking reference
pub const BOOKING_REF_PREFIX: &str = "FRA-BE-";

/// Fixed suffix of every booking reference
pub const BOOKING_REF_SUFFIX: &str = "-BOOKING";

/// Number of trailing Unix-millisecond digits kept in a booking reference
pub const BOOKING_REF_TIME_DIGITS: u32 = 8;

/// Number of property-name characters kept in a booking reference
pub const BOOKING_REF_NAME_CHARS: usize = 6;

/// Seconds in one booked night
pub const SECONDS_PER_NIGHT: i64 = 86_400;

/// Default share of the total collected up front, in percent
pub const DEFAULT_ADVANCE_PERCENT: u8 = 50;

/// Header carrying the authenticated user id from the session layer
pub const IDENTITY_HEADER: &str = "x-user-id";

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8080;
