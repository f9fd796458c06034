//! Defines the core data model and database queries for expenses.

use std::str::FromStr;

use rusqlite::{Connection, Row, types::Type};
use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, expense::DateRange, user::UserID};

/// Alias for the integer type used for expense IDs.
pub type ExpenseId = i64;

type RowsAffected = usize;

/// The largest absolute amount, exclusive, that fits in eight digits with two decimal places.
const AMOUNT_LIMIT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

// ============================================================================
// MODELS
// ============================================================================

/// A single purchase recorded by a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The user that recorded the expense.
    pub owner: UserID,
    /// When the expense happened, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// What the money was spent on.
    pub description: String,
    /// How much was spent, always with two decimal places.
    pub amount: Decimal,
    /// Free text notes, may be empty.
    pub comment: String,
}

impl Expense {
    /// Create a new expense.
    ///
    /// Shortcut for [NewExpense] for discoverability.
    pub fn build(amount: Decimal, date: OffsetDateTime, description: &str) -> NewExpense {
        NewExpense {
            date,
            description: description.to_owned(),
            amount,
            comment: String::new(),
        }
    }
}

/// The fields of an expense that a user provides.
///
/// Used both to create an expense and to replace all the fields of an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// When the expense happened.
    pub date: OffsetDateTime,
    /// What the money was spent on.
    pub description: String,
    /// How much was spent.
    ///
    /// Must have at most two decimal places and be smaller than 1,000,000 in absolute value.
    pub amount: Decimal,
    /// Free text notes, may be empty.
    pub comment: String,
}

impl NewExpense {
    /// Set the comment for the expense.
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_owned();
        self
    }
}

/// Check that `amount` fits in eight digits with two decimal places and rescale it to exactly
/// two decimal places.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `amount` has more than two significant decimal places or
/// its absolute value is 1,000,000 or more.
pub fn normalize_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount.normalize().scale() > 2 || amount.abs() >= AMOUNT_LIMIT {
        return Err(Error::InvalidAmount(amount.to_string()));
    }

    let mut amount = amount;
    amount.rescale(2);

    Ok(amount)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    // `date` is nullable so that rows without a date are reported instead of being rejected
    // at the schema level.
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                date INTEGER,
                description TEXT NOT NULL,
                amount TEXT NOT NULL,
                comment TEXT NOT NULL DEFAULT '',
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Create a new expense owned by `owner`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount does not fit in eight digits with two decimal places,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(
    owner: UserID,
    new_expense: NewExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    let amount = normalize_amount(new_expense.amount)?;

    let raw_expense = connection
        .prepare(
            "INSERT INTO expense (user_id, date, description, amount, comment)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, user_id, date, description, amount, comment",
        )?
        .query_row(
            (
                owner.as_i64(),
                new_expense.date.unix_timestamp(),
                new_expense.description,
                amount.to_string(),
                new_expense.comment,
            ),
            map_expense_row,
        )?;

    Expense::try_from(raw_expense)
}

/// Retrieve the expense `id` owned by `owner`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `owner`,
/// - [Error::InvalidExpenseDate] if the stored expense has no date,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_expense(
    owner: UserID,
    id: ExpenseId,
    connection: &Connection,
) -> Result<Expense, Error> {
    let raw_expense = connection
        .prepare(
            "SELECT id, user_id, date, description, amount, comment
             FROM expense WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(
            &[(":id", &id), (":user_id", &owner.as_i64())],
            map_expense_row,
        )?;

    Expense::try_from(raw_expense)
}

/// Retrieve the expenses owned by `owner`, optionally only those inside `date_range`.
///
/// Expenses are ordered by date, with ties broken by ID.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidExpenseDate] if a stored expense has no date,
/// - or [Error::SqlError] if there is some SQL error.
pub fn get_expenses(
    owner: UserID,
    date_range: Option<DateRange>,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let (start, end) = match date_range {
        Some(range) => (
            Some(range.start().unix_timestamp()),
            Some(range.end().unix_timestamp()),
        ),
        None => (None, None),
    };

    connection
        .prepare(
            "SELECT id, user_id, date, description, amount, comment
             FROM expense
             WHERE user_id = ?1 AND (?2 IS NULL OR date BETWEEN ?2 AND ?3)
             ORDER BY date ASC, id ASC",
        )?
        .query_map((owner.as_i64(), start, end), map_expense_row)?
        .map(|raw_expense| Expense::try_from(raw_expense?))
        .collect()
}

/// Replace the fields of the expense `id` owned by `owner`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `owner`,
/// - [Error::InvalidAmount] if the amount does not fit in eight digits with two decimal places,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_expense(
    owner: UserID,
    id: ExpenseId,
    new_expense: NewExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    let amount = normalize_amount(new_expense.amount)?;

    let raw_expense = connection
        .prepare(
            "UPDATE expense
             SET date = ?1, description = ?2, amount = ?3, comment = ?4
             WHERE id = ?5 AND user_id = ?6
             RETURNING id, user_id, date, description, amount, comment",
        )?
        .query_row(
            (
                new_expense.date.unix_timestamp(),
                new_expense.description,
                amount.to_string(),
                new_expense.comment,
                id,
                owner.as_i64(),
            ),
            map_expense_row,
        )?;

    Expense::try_from(raw_expense)
}

/// Delete the expense `id` owned by `owner`.
///
/// Returns the number of deleted rows, zero if there was no such expense.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn delete_expense(
    owner: UserID,
    id: ExpenseId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
            (id, owner.as_i64()),
        )
        .map_err(|error| error.into())
}

/// Get the total number of expenses in the database, across all users.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_expenses(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM expense;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// An expense row as stored, before its date has been checked.
struct RawExpense {
    id: ExpenseId,
    owner: UserID,
    date: Option<i64>,
    description: String,
    amount: Decimal,
    comment: String,
}

impl TryFrom<RawExpense> for Expense {
    type Error = Error;

    fn try_from(raw: RawExpense) -> Result<Self, Self::Error> {
        let date = raw
            .date
            .and_then(|timestamp| OffsetDateTime::from_unix_timestamp(timestamp).ok())
            .ok_or(Error::InvalidExpenseDate(raw.id))?;

        Ok(Expense {
            id: raw.id,
            owner: raw.owner,
            date,
            description: raw.description,
            amount: raw.amount,
            comment: raw.comment,
        })
    }
}

fn map_expense_row(row: &Row) -> Result<RawExpense, rusqlite::Error> {
    let raw_amount: String = row.get(4)?;
    let amount = Decimal::from_str(&raw_amount).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(error))
    })?;

    Ok(RawExpense {
        id: row.get(0)?,
        owner: UserID::new(row.get(1)?),
        date: row.get(2)?,
        description: row.get(3)?,
        amount,
        comment: row.get(5)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
