//! Registration of new accounts.
//!
//! Registering creates the user and issues their API key in one database transaction.

use axum::{Json, extract::State};
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::Deserialize;

use crate::{
    Error, PasswordHash, ValidatedPassword,
    account::authenticate::{AccountState, AuthenticatedUser},
    auth::{ApiKey, create_api_key},
    user::{NewUser, User, create_user, username_exists, validate_username},
};

/// The body of a registration request.
///
/// Missing and empty fields are treated the same.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    /// The name the user will log in with.
    #[serde(default)]
    pub username: Option<String>,
    /// The user's password in plain text.
    #[serde(default)]
    pub password: Option<String>,
    /// The user's email address.
    #[serde(default)]
    pub email: Option<String>,
    /// The user's given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// The user's family name.
    #[serde(default)]
    pub last_name: Option<String>,
}

/// The validated details of an account that is about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// The name the user will log in with.
    pub username: String,
    /// The user's email address, may be empty.
    pub email: String,
    /// The user's given name, may be empty.
    pub first_name: String,
    /// The user's family name, may be empty.
    pub last_name: String,
    /// The user's password.
    pub password: ValidatedPassword,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn validate_email(email: &str) -> Result<(), Error> {
    if email.is_empty() {
        return Ok(());
    }

    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err(Error::InvalidEmail(email.to_owned())),
    }
}

impl NewAccount {
    /// Validate a registration request.
    ///
    /// The checks run in this order, and the first failure is returned: the username is present
    /// and well formed, the username is not taken, the password is present, the password is
    /// strong enough, and finally the email address (if given) is well formed.
    ///
    /// # Errors
    /// Returns [Error::MissingUsername], [Error::InvalidUsername], [Error::DuplicateUsername],
    /// [Error::MissingPassword], [Error::TooWeak] or [Error::InvalidEmail] for invalid requests,
    /// or [Error::SqlError] if the username could not be checked.
    pub fn validate(request: RegisterRequest, connection: &Connection) -> Result<Self, Error> {
        let username = non_empty(request.username).ok_or(Error::MissingUsername)?;
        validate_username(&username)?;

        if username_exists(&username, connection)? {
            return Err(Error::DuplicateUsername);
        }

        // Passwords are not trimmed, leading and trailing spaces are part of the password.
        let raw_password = request
            .password
            .filter(|password| !password.is_empty())
            .ok_or(Error::MissingPassword)?;

        let email = non_empty(request.email).unwrap_or_default();
        let first_name = non_empty(request.first_name).unwrap_or_default();
        let last_name = non_empty(request.last_name).unwrap_or_default();

        let user_inputs = [
            username.as_str(),
            email.as_str(),
            first_name.as_str(),
            last_name.as_str(),
        ];
        let password = ValidatedPassword::new(&raw_password, &user_inputs)?;

        validate_email(&email)?;

        Ok(Self {
            username,
            email,
            first_name,
            last_name,
            password,
        })
    }

    /// Hash the password with bcrypt at `password_cost`, see [PasswordHash::new].
    ///
    /// Hashing is slow and does not use the database, so call this without holding the
    /// connection lock.
    ///
    /// # Errors
    /// Returns [Error::HashingError] if the password could not be hashed.
    pub fn into_new_user(self, password_cost: u32) -> Result<NewUser, Error> {
        Ok(NewUser {
            password_hash: PasswordHash::new(self.password, password_cost)?,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
        })
    }
}

/// Create `new_user` and issue their API key.
///
/// The user and the key are inserted in a single transaction, so a user never exists without
/// a key.
///
/// # Errors
/// Returns [Error::DuplicateUsername] if the username was taken since the account was validated,
/// or [Error::SqlError] if the records could not be inserted.
pub fn register_account(
    new_user: NewUser,
    api_key_secret: &str,
    connection: &Connection,
) -> Result<(User, ApiKey), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let user = create_user(new_user, &transaction)?;
    let api_key = create_api_key(user.id, api_key_secret, &transaction)?;

    transaction.commit()?;

    Ok((user, api_key))
}

/// Handler for registration requests via the POST method.
///
/// On success, responds with the same body as a successful log-in so the client can start using
/// the API key straight away. The database lock is released while the password is hashed.
///
/// # Errors
///
/// Returns a 400 error explaining the problem if the request is invalid, see
/// [NewAccount::validate].
pub async fn register_user(
    State(state): State<AccountState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthenticatedUser>, Error> {
    let account = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        NewAccount::validate(request, &connection)?
    };

    let new_user = account
        .into_new_user(PasswordHash::DEFAULT_COST)
        .inspect_err(|error| tracing::error!("Could not hash a new password: {error}"))?;

    let (user, api_key) = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        register_account(new_user, &state.api_key_secret, &connection)
            .inspect_err(|error| tracing::error!("Could not register a new account: {error}"))?
    };

    tracing::info!("Registered user {} with ID {}", user.username, user.id);

    Ok(Json(AuthenticatedUser::new(user, api_key)))
}
