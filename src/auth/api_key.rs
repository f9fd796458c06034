//! API keys identify a user on every request to a protected route.
//!
//! Each user has exactly one key, issued when their account is registered.

use rusqlite::{Connection, Row};
use serde::Serialize;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserID};

/// The API key of a single user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiKey {
    /// The user the key belongs to.
    pub user_id: UserID,
    /// The key as a 64 character lowercase hex string.
    pub key: String,
    /// When the key was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
}

/// Derive a new key for `user_id` from the time it is issued and the server secret.
pub(crate) fn generate_api_key(user_id: UserID, issued_at: OffsetDateTime, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(issued_at.unix_timestamp_nanos().to_string());
    hasher.update(b":");
    hasher.update(secret);
    hasher.update(b":");
    hasher.update(user_id.as_i64().to_string());

    format!("{:x}", hasher.finalize())
}

/// Create the API key table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_api_key_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS api_key (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL UNIQUE,
                key TEXT NOT NULL UNIQUE,
                created INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Issue a new API key for `user_id` and store it.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the user already has a key, the user does not exist, or
/// another SQL related error occurred.
pub fn create_api_key(
    user_id: UserID,
    secret: &str,
    connection: &Connection,
) -> Result<ApiKey, Error> {
    let issued_at = OffsetDateTime::now_utc();
    let key = generate_api_key(user_id, issued_at, secret);
    // The table stores whole seconds.
    let created = issued_at - Duration::nanoseconds(issued_at.nanosecond().into());

    connection.execute(
        "INSERT INTO api_key (user_id, key, created) VALUES (?1, ?2, ?3)",
        (user_id.as_i64(), &key, created.unix_timestamp()),
    )?;

    Ok(ApiKey {
        user_id,
        key,
        created,
    })
}

/// Get the API key of the user `user_id`.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if the user does not have an API key,
/// - or [Error::SqlError] if an SQL related error occurred.
pub fn get_api_key_for_user(user_id: UserID, connection: &Connection) -> Result<ApiKey, Error> {
    connection
        .prepare("SELECT user_id, key, created FROM api_key WHERE user_id = :user_id")?
        .query_row(&[(":user_id", &user_id.as_i64())], map_api_key_row)
        .map_err(|error| error.into())
}

fn map_api_key_row(row: &Row) -> Result<ApiKey, rusqlite::Error> {
    let created: i64 = row.get(2)?;
    let created = OffsetDateTime::from_unix_timestamp(created).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Integer,
            Box::new(error),
        )
    })?;

    Ok(ApiKey {
        user_id: UserID::new(row.get(0)?),
        key: row.get(1)?,
        created,
    })
}
