//! The `date__range` filter for listing expenses.

use serde::Deserialize;
use time::OffsetDateTime;
use time_tz::Tz;

use crate::{Error, expense::payload::DateInput};

/// An inclusive range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl DateRange {
    /// Create a range from `start` to `end`, both inclusive.
    ///
    /// A range where `start` is after `end` is empty.
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Self {
        Self { start, end }
    }

    /// The first instant in the range.
    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    /// The last instant in the range.
    pub fn end(&self) -> OffsetDateTime {
        self.end
    }

    /// Build a range from the values of the `date__range` query parameter.
    ///
    /// Accepts either a single `<from>,<to>` value or two separate values. A plain date as the
    /// upper bound covers that whole day.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateRange] if there are not exactly two dates, or
    /// [Error::InvalidDate] if either date cannot be parsed or is outside the years that can be
    /// stored.
    pub fn from_query_values(values: &[String], timezone: &Tz) -> Result<Option<Self>, Error> {
        let (start, end) = match values {
            [] => return Ok(None),
            [single] => single.split_once(',').ok_or_else(|| {
                Error::InvalidDateRange(format!(
                    "expected two dates separated by a comma, got \"{single}\""
                ))
            })?,
            [start, end] => (start.as_str(), end.as_str()),
            _ => {
                return Err(Error::InvalidDateRange(format!(
                    "expected two dates, got {}",
                    values.len()
                )));
            }
        };

        let start = DateInput::parse(start)?.checked_start(start, timezone)?;
        let end = DateInput::parse(end)?.checked_end(end, timezone)?;

        Ok(Some(Self::new(start, end)))
    }
}

/// The query parameters accepted when listing expenses.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseListQuery {
    /// The dates of the `date__range` filter, see [DateRange::from_query_values].
    #[serde(rename = "date__range", default)]
    pub date_range: Vec<String>,
}
