//! Expense Tracker is a web backend for recording personal expenses.
//!
//! This library provides a JSON REST API for registering users, managing
//! expenses, and reporting weekly spending totals. Clients authenticate with
//! an API key that is issued when an account is registered.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod account;
mod app_state;
mod auth;
mod db;
mod endpoints;
mod expense;
mod logging;
mod not_found;
mod password;
mod routing;
mod timezone;
mod user;
mod weekly_total;

pub use account::{NewAccount, register_account};
pub use app_state::AppState;
pub use auth::{ApiKey, get_api_key_for_user};
pub use db::initialize as initialize_db;
pub use expense::{
    DateRange, Expense, ExpenseId, NewExpense, count_expenses, create_expense, get_expense,
    get_expenses,
};
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use timezone::get_timezone;
pub use user::{
    NewUser, User, UserID, count_users, get_user_by_id, get_user_by_username, set_user_active,
    update_password,
};
pub use weekly_total::{IsoWeek, WeeklyTotal, aggregate_weekly_totals, iso_week_start};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The registration request did not include a username.
    #[error("A username is required")]
    MissingUsername,

    /// The username contains characters other than letters, digits and
    /// `@.+-_`, or is too long.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// The username is already used by another account.
    #[error("That username has already been taken")]
    DuplicateUsername,

    /// The registration request did not include a password.
    #[error("A password is required")]
    MissingPassword,

    /// The email address provided during registration is malformed.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The user provided an invalid combination of username and password.
    #[error("Username or password is incorrect")]
    InvalidCredentials,

    /// The user has valid credentials, but their account has been deactivated.
    #[error("Your account has been disabled")]
    AccountDisabled,

    /// The request did not include an `Authorization` header with an API key.
    #[error("an API key is required, use the header \"Authorization: ApiKey <username>:<api_key>\"")]
    MissingApiKey,

    /// The API key in the request does not match the user's API key.
    #[error("the API key is not valid")]
    InvalidApiKey,

    /// The body of an expense request is missing a field or has an invalid
    /// value.
    #[error("invalid expense: {0}")]
    InvalidExpense(String),

    /// A date string could not be parsed.
    ///
    /// Callers should pass in the string that could not be parsed.
    #[error("could not parse \"{0}\" as a date, use the format YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS with an optional UTC offset")]
    InvalidDate(String),

    /// The `date__range` filter does not have exactly two dates.
    #[error("invalid date range: {0}")]
    InvalidDateRange(String),

    /// An amount has more than two decimal places or too many digits.
    #[error("{0} is not a valid amount, amounts must be less than 1000000 and have at most two decimal places")]
    InvalidAmount(String),

    /// An expense was read from the database without a usable date.
    ///
    /// Expenses without a date cannot be placed in a week, so this is reported
    /// instead of skipping the expense.
    #[error("the expense with ID {0} does not have a valid date")]
    InvalidExpenseDate(i64),

    /// An ISO week that does not exist, e.g. week 53 of a 52 week year.
    #[error("week {week} of {year} is not a valid ISO week")]
    InvalidIsoWeek {
        /// The ISO year.
        year: i32,
        /// The ISO week number.
        week: u8,
    },

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub success: bool,
    pub reason: String,
}

impl ErrorResponse {
    pub(crate) fn new(reason: impl ToString) -> Self {
        Self {
            success: false,
            reason: reason.to_string(),
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingUsername
            | Error::InvalidUsername(_)
            | Error::DuplicateUsername
            | Error::MissingPassword
            | Error::InvalidEmail(_)
            | Error::TooWeak(_)
            | Error::InvalidExpense(_)
            | Error::InvalidDate(_)
            | Error::InvalidDateRange(_)
            | Error::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::MissingApiKey | Error::InvalidApiKey => {
                StatusCode::UNAUTHORIZED
            }
            Error::AccountDisabled => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::InvalidExpenseDate(_)
            | Error::InvalidIsoWeek { .. }
            | Error::SqlError(_)
            | Error::DatabaseLockError
            | Error::InvalidTimezoneError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        // Any errors that are server faults are not intended to be shown to the client.
        let body = if status_code.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
            ErrorResponse::new(
                "An unexpected error occurred, check the server logs for more details.",
            )
        } else {
            ErrorResponse::new(&self)
        };

        (status_code, Json(body)).into_response()
    }
}
