//! Timestamps at storage precision.
//!
//! PostgreSQL `TIMESTAMPTZ` keeps microseconds. Rows stamped with a
//! nanosecond clock would come back different from what was written, so
//! every timestamp an entity carries is cut to microseconds first.

use chrono::{DateTime, SubsecRound, Utc};

/// Fractional-second digits kept by storage.
pub const STORED_SUBSEC_DIGITS: u16 = 6;

/// The current time, truncated to microseconds.
pub fn now() -> DateTime<Utc> {
    stored(Utc::now())
}

/// `at`, truncated to microseconds.
pub fn stored(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(STORED_SUBSEC_DIGITS)
}

/// Optional variant of [`stored`].
pub fn stored_opt(at: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    at.map(stored)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike};

    use super::*;

    #[test]
    fn test_now_has_no_sub_microsecond_part() {
        assert_eq!(now().nanosecond() % 1_000, 0);
    }

    #[test]
    fn test_stored_truncates_instead_of_rounding() {
        let at = Utc
            .with_ymd_and_hms(2026, 3, 1, 20, 12, 45)
            .unwrap()
            .with_nanosecond(457_166_572)
            .unwrap();
        assert_eq!(stored(at).nanosecond(), 457_166_000);
        assert_eq!(stored(stored(at)), stored(at));
        assert_eq!(stored_opt(None), None);
    }
}
