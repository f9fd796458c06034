//! Parsing of expense request bodies and rendering of expense response bodies.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::{format_description, time},
};
use time_tz::Tz;

use crate::{
    Error,
    endpoints::{self, format_endpoint},
    expense::{Expense, ExpenseId, NewExpense},
    timezone::{checked_utc, localize, to_local},
};

/// The maximum number of characters in an expense description.
pub const MAX_DESCRIPTION_LENGTH: usize = 255;

const NAIVE_DATE_TIME_FORMATS: [&[BorrowedFormatItem<'static>]; 4] = [
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
];

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// A date or date-time sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateInput {
    /// A date-time with an explicit UTC offset.
    Instant(OffsetDateTime),
    /// A wall clock date-time without a UTC offset.
    Local(PrimitiveDateTime),
    /// A calendar date without a time.
    Day(Date),
}

impl DateInput {
    /// Parse an RFC 3339 date-time, a date-time without an offset, or a plain `YYYY-MM-DD` date.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if `input` is in none of these formats.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let input = input.trim();

        if let Ok(date_time) = OffsetDateTime::parse(input, &Rfc3339) {
            return Ok(Self::Instant(date_time));
        }

        for format in NAIVE_DATE_TIME_FORMATS {
            if let Ok(date_time) = PrimitiveDateTime::parse(input, format) {
                return Ok(Self::Local(date_time));
            }
        }

        Date::parse(input, DATE_FORMAT)
            .map(Self::Day)
            .map_err(|_| Error::InvalidDate(input.to_owned()))
    }

    /// The instant this input refers to, reading wall clock times in `timezone`.
    ///
    /// A plain date refers to midnight at the start of that day.
    pub fn start_instant(self, timezone: &Tz) -> OffsetDateTime {
        match self {
            Self::Instant(date_time) => date_time,
            Self::Local(date_time) => localize(date_time, timezone),
            Self::Day(date) => localize(date.midnight(), timezone),
        }
    }

    /// Like [DateInput::start_instant], but converted to UTC.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] with `input` if the instant cannot be stored or shown in
    /// `timezone`.
    pub fn checked_start(self, input: &str, timezone: &Tz) -> Result<OffsetDateTime, Error> {
        checked_utc(self.start_instant(timezone), timezone)
            .ok_or_else(|| Error::InvalidDate(input.to_owned()))
    }

    /// Like [DateInput::end_instant], but converted to UTC.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] with `input` if the instant cannot be stored or shown in
    /// `timezone`.
    pub fn checked_end(self, input: &str, timezone: &Tz) -> Result<OffsetDateTime, Error> {
        checked_utc(self.end_instant(timezone), timezone)
            .ok_or_else(|| Error::InvalidDate(input.to_owned()))
    }

    /// Like [DateInput::start_instant], except a plain date refers to the last second of that
    /// day.
    pub fn end_instant(self, timezone: &Tz) -> OffsetDateTime {
        match self {
            Self::Day(date) => match date.next_day() {
                Some(next_day) => {
                    localize(next_day.midnight(), timezone) - time::Duration::SECOND
                }
                None => localize(PrimitiveDateTime::new(date, time!(23:59:59)), timezone),
            },
            _ => self.start_instant(timezone),
        }
    }
}

/// The body of a request that creates or replaces an expense.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpensePayload {
    /// What the money was spent on.
    #[serde(default)]
    pub description: Option<String>,
    /// How much was spent, as a JSON number or a string. Defaults to zero.
    #[serde(default)]
    pub amount: Option<Value>,
    /// When the expense happened.
    #[serde(default)]
    pub date: Option<String>,
    /// Free text notes.
    #[serde(default)]
    pub comment: Option<String>,
}

fn parse_amount(value: Option<Value>) -> Result<Decimal, Error> {
    let text = match value {
        None | Some(Value::Null) => return Ok(Decimal::ZERO),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(Decimal::ZERO),
        Some(Value::String(text)) => text.trim().to_owned(),
        Some(other) => return Err(Error::InvalidAmount(other.to_string())),
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| Error::InvalidAmount(text))
}

impl ExpensePayload {
    /// Validate the payload and convert it into the fields of an expense.
    ///
    /// Dates without a UTC offset are read as wall clock times in `timezone`.
    ///
    /// # Errors
    /// Returns [Error::InvalidExpense] if the description or date is missing or the description
    /// is too long, [Error::InvalidDate] if the date cannot be parsed or is outside the years
    /// that can be stored, or [Error::InvalidAmount] if the amount is not a number.
    pub fn into_new_expense(self, timezone: &Tz) -> Result<NewExpense, Error> {
        let description = self
            .description
            .map(|description| description.trim().to_owned())
            .filter(|description| !description.is_empty())
            .ok_or_else(|| Error::InvalidExpense("a description is required".to_owned()))?;

        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(Error::InvalidExpense(format!(
                "the description can have at most {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }

        let raw_date = self
            .date
            .filter(|date| !date.trim().is_empty())
            .ok_or_else(|| Error::InvalidExpense("a date is required".to_owned()))?;
        let date = DateInput::parse(&raw_date)?.checked_start(&raw_date, timezone)?;

        Ok(NewExpense {
            date,
            description,
            amount: parse_amount(self.amount)?,
            comment: self.comment.unwrap_or_default(),
        })
    }
}

/// An expense as it is sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseResponse {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// What the money was spent on.
    pub description: String,
    /// Free text notes.
    pub comment: String,
    /// How much was spent, e.g. "747.00".
    pub amount: Decimal,
    /// When the expense happened, in the server's timezone.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// The URI of the expense.
    pub resource_uri: String,
}

impl ExpenseResponse {
    /// Render `expense` with its date converted to `timezone`.
    pub fn new(expense: Expense, timezone: &Tz) -> Self {
        Self {
            resource_uri: format_endpoint(endpoints::EXPENSE, expense.id),
            id: expense.id,
            description: expense.description,
            comment: expense.comment,
            amount: expense.amount,
            date: to_local(expense.date, timezone),
        }
    }
}
