//! Human-readable booking references.
//!
//! Format: `FRA-BE-<last 8 digits of Unix millis>-<first 6 alphanumerics of
//! the property name, uppercased>-BOOKING`.

use crate::constants::{
    BOOKING_REF_NAME_CHARS, BOOKING_REF_PREFIX, BOOKING_REF_SUFFIX, BOOKING_REF_TIME_DIGITS,
};

pub fn booking_reference(unix_millis: i64, property_name: &str) -> String {
    let modulus = 10_i64.pow(BOOKING_REF_TIME_DIGITS);
    let time_part = unix_millis.rem_euclid(modulus);
    let name_part: String = property_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(BOOKING_REF_NAME_CHARS)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    format!(
        "{BOOKING_REF_PREFIX}{time_part:0width$}-{name_part}{BOOKING_REF_SUFFIX}",
        width = BOOKING_REF_TIME_DIGITS as usize
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lakeview_retreat_reference() {
        assert_eq!(
            booking_reference(1_735_689_600_123, "Lakeview Retreat"),
            "FRA-BE-89600123-LAKEVI-BOOKING"
        );
    }

    #[test]
    fn punctuation_is_skipped_and_short_names_kept() {
        assert_eq!(
            booking_reference(1_700_000_000_000, "A-1 Inn"),
            "FRA-BE-00000000-A1INN-BOOKING"
        );
    }

    #[test]
    fn time_fragment_is_zero_padded() {
        assert_eq!(
            booking_reference(42, "Hill Top Homestay"),
            "FRA-BE-00000042-HILLTO-BOOKING"
        );
    }
}
