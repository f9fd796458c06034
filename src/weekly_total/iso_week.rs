//! ISO 8601 week arithmetic.

use std::fmt::Display;

use time::{Date, Duration, Month, util::weeks_in_year};

use crate::Error;

/// A week in the ISO 8601 week calendar.
///
/// Weeks run Monday to Sunday and week 1 of a year is the week containing the year's first
/// Thursday, so the first days of January can belong to the last week of the previous year.
///
/// Ordering is chronological: by year, then by week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoWeek {
    /// The ISO year, which can differ from the calendar year near the new year.
    pub year: i32,
    /// The week number, from 1 to 52 or 53.
    pub week: u8,
}

impl IsoWeek {
    /// Get the ISO week that contains `date`.
    pub fn of(date: Date) -> Self {
        let (year, week, _) = date.to_iso_week_date();

        Self { year, week }
    }

    /// The Monday that starts this week.
    ///
    /// # Errors
    /// Returns [Error::InvalidIsoWeek] if the week does not exist, see [iso_week_start].
    pub fn start_date(&self) -> Result<Date, Error> {
        iso_week_start(self.year, self.week)
    }
}

impl Display for IsoWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// Get the date of the Monday that starts week `week` of the ISO year `year`.
///
/// January 4th is always in week 1, so week 1 starts on the Monday on or before January 4th and
/// later weeks follow at seven day intervals.
///
/// # Errors
/// Returns [Error::InvalidIsoWeek] if `week` is zero or larger than the number of weeks in
/// `year`, or if the date is outside the supported range.
pub fn iso_week_start(year: i32, week: u8) -> Result<Date, Error> {
    let invalid_week = || Error::InvalidIsoWeek { year, week };

    if week == 0 || week > weeks_in_year(year) {
        return Err(invalid_week());
    }

    let anchor = Date::from_calendar_date(year, Month::January, 4).map_err(|_| invalid_week())?;
    let days_since_monday = anchor.weekday().number_days_from_monday();
    let first_monday = anchor
        .checked_sub(Duration::days(days_since_monday.into()))
        .ok_or_else(invalid_week)?;

    first_monday
        .checked_add(Duration::weeks(i64::from(week) - 1))
        .ok_or_else(invalid_week)
}
