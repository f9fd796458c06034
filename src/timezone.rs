//! Conversions between UTC instants and the server's local timezone.

use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use time_tz::{Offset, TimeZone, Tz};

use crate::Error;

/// Look up a timezone by its canonical name, e.g. "Pacific/Auckland".
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] if `canonical_timezone` is not a known timezone.
pub fn get_timezone(canonical_timezone: &str) -> Result<&'static Tz, Error> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))
}

/// Interpret a date-time without a UTC offset as a wall clock time in `timezone`.
///
/// Wall clock times that are skipped or repeated by a daylight saving transition resolve to the
/// offset in effect just after the transition.
pub(crate) fn localize(date_time: PrimitiveDateTime, timezone: &Tz) -> OffsetDateTime {
    let first_guess = timezone
        .get_offset_utc(&date_time.assume_utc())
        .to_utc();
    let candidate = date_time.assume_offset(first_guess);
    let offset = timezone.get_offset_utc(&candidate).to_utc();

    if offset == first_guess {
        candidate
    } else {
        date_time.assume_offset(offset)
    }
}

/// Convert `date_time` to UTC, checking that the result can be stored and shown in `timezone`.
///
/// Returns `None` if the instant, in UTC or in `timezone`, falls outside the years -9999 to 9999.
pub(crate) fn checked_utc(date_time: OffsetDateTime, timezone: &Tz) -> Option<OffsetDateTime> {
    let utc = date_time.checked_to_offset(UtcOffset::UTC)?;
    utc.checked_to_offset(timezone.get_offset_utc(&utc).to_utc())?;

    Some(utc)
}

/// Convert `date_time` to the wall clock time in `timezone`.
///
/// Instants that cannot be shown in `timezone` are returned unchanged.
pub(crate) fn to_local(date_time: OffsetDateTime, timezone: &Tz) -> OffsetDateTime {
    date_time
        .checked_to_offset(timezone.get_offset_utc(&date_time).to_utc())
        .unwrap_or(date_time)
}

#[cfg(test)]
mod tests {
    use time::{
        Date, Month,
        macros::{datetime, offset},
    };

    use crate::{
        Error,
        timezone::{checked_utc, get_timezone, localize, to_local},
    };

    #[test]
    fn get_timezone_fails_on_unknown_name() {
        let result = get_timezone("Not/AZone");

        assert!(
            matches!(&result, Err(Error::InvalidTimezoneError(name)) if name == "Not/AZone"),
            "want invalid timezone error, got a timezone"
        );
    }

    #[test]
    fn localize_uses_standard_time() {
        let auckland = get_timezone("Pacific/Auckland").unwrap();

        let got = localize(datetime!(2014 - 06 - 30 0:00), auckland);

        assert_eq!(got, datetime!(2014 - 06 - 30 0:00 +12));
        assert_eq!(got.offset(), offset!(+12));
    }

    #[test]
    fn localize_uses_daylight_saving_time() {
        let auckland = get_timezone("Pacific/Auckland").unwrap();

        let got = localize(datetime!(2015 - 12 - 31 0:00), auckland);

        assert_eq!(got.offset(), offset!(+13));
        assert_eq!(got, datetime!(2015 - 12 - 30 11:00 UTC));
    }

    #[test]
    fn localize_in_utc_is_identity() {
        let utc = get_timezone("Etc/UTC").unwrap();

        let got = localize(datetime!(2016 - 01 - 02 13:45), utc);

        assert_eq!(got, datetime!(2016 - 01 - 02 13:45 UTC));
    }

    #[test]
    fn to_local_converts_offset() {
        let auckland = get_timezone("Pacific/Auckland").unwrap();

        let got = to_local(datetime!(2014 - 06 - 29 12:00 UTC), auckland);

        assert_eq!(got.offset(), offset!(+12));
        assert_eq!(got.date(), time::macros::date!(2014 - 06 - 30));
    }

    #[test]
    fn checked_utc_normalizes_offset() {
        let auckland = get_timezone("Pacific/Auckland").unwrap();

        let got = checked_utc(datetime!(2014 - 06 - 30 0:00 +12), auckland).unwrap();

        assert_eq!(got, datetime!(2014 - 06 - 29 12:00 UTC));
        assert_eq!(got.offset(), offset!(UTC));
    }

    #[test]
    fn checked_utc_rejects_instant_after_last_utc_year() {
        let utc = get_timezone("Etc/UTC").unwrap();

        assert_eq!(checked_utc(datetime!(9999 - 12 - 31 23:00 -5), utc), None);
    }

    #[test]
    fn checked_utc_rejects_instant_before_first_utc_year() {
        let utc = get_timezone("Etc/UTC").unwrap();

        let date_time = Date::from_calendar_date(-9999, Month::January, 1)
            .unwrap()
            .with_hms(1, 0, 0)
            .unwrap()
            .assume_offset(offset!(+5));

        assert_eq!(checked_utc(date_time, utc), None);
    }

    #[test]
    fn checked_utc_rejects_instant_that_cannot_be_shown_locally() {
        let auckland = get_timezone("Pacific/Auckland").unwrap();

        assert_eq!(
            checked_utc(datetime!(9999 - 12 - 31 23:00 UTC), auckland),
            None
        );
    }

    #[test]
    fn to_local_keeps_instant_that_cannot_be_shown_locally() {
        let auckland = get_timezone("Pacific/Auckland").unwrap();
        let date_time = datetime!(9999 - 12 - 31 23:00 UTC);

        assert_eq!(to_local(date_time, auckland), date_time);
    }
}
