//! The endpoint that exchanges a username and password for the user's API key.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{ApiKey, get_api_key_for_user},
    user::{User, get_user_by_username},
};

/// The state needed to register or authenticate a user.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The secret mixed into newly issued API keys.
    pub api_key_secret: String,
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            api_key_secret: state.api_key_secret.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a log-in request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogInRequest {
    /// The name the user logs in with.
    #[serde(default)]
    pub username: String,
    /// The user's password in plain text.
    #[serde(default)]
    pub password: String,
}

/// The body sent to a client that has logged in or registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Always `true`, failures use the error body instead.
    pub success: bool,
    /// The name the user logs in with.
    pub username: String,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The key the client should send in the `Authorization` header.
    pub api_key: String,
}

impl AuthenticatedUser {
    pub(crate) fn new(user: User, api_key: ApiKey) -> Self {
        Self {
            success: true,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            api_key: api_key.key,
        }
    }
}

/// Find the user trying to log in as `username`.
///
/// # Errors
/// Returns [Error::InvalidCredentials] if there is no user called `username`.
pub fn find_log_in_user(username: &str, connection: &Connection) -> Result<User, Error> {
    match get_user_by_username(username, connection) {
        Err(Error::NotFound) => Err(Error::InvalidCredentials),
        result => result,
    }
}

/// Check `password` against `user`'s password and return the user if it matches.
///
/// Does not use the database, call it after releasing the connection lock.
///
/// # Errors
/// Returns [Error::InvalidCredentials] if the password is wrong, and [Error::AccountDisabled] if
/// the password is right but the user is inactive.
pub fn check_credentials(user: User, password: &str) -> Result<User, Error> {
    if !user.password_hash.verify(password)? {
        return Err(Error::InvalidCredentials);
    }

    if !user.is_active {
        return Err(Error::AccountDisabled);
    }

    Ok(user)
}

/// Handler for log-in requests via the POST method.
///
/// Responds with the user's details and API key. The database lock is released while the
/// password is verified.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The username or password is not correct.
/// - The user's account has been disabled.
/// - An internal error occurred when verifying the password or reading the API key.
pub async fn authenticate_user(
    State(state): State<AccountState>,
    Json(request): Json<LogInRequest>,
) -> Result<Json<AuthenticatedUser>, Error> {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        find_log_in_user(&request.username, &connection)
    };

    let user = user
        .and_then(|user| check_credentials(user, &request.password))
        .inspect_err(|error| {
            tracing::info!("Failed log-in attempt for {:?}: {error}", request.username)
        })?;

    let api_key = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        get_api_key_for_user(user.id, &connection)?
    };

    Ok(Json(AuthenticatedUser::new(user, api_key)))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, extract::State};
    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash, ValidatedPassword,
        account::authenticate::{
            AccountState, LogInRequest, authenticate_user, check_credentials, find_log_in_user,
        },
        auth::create_api_key,
        db::initialize,
        user::{NewUser, User, create_user, set_user_active},
    };

    const PASSWORD: &str = "averysafeandsecurepassword";

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let user = create_user(
            NewUser {
                username: "jamesl".to_owned(),
                email: String::new(),
                first_name: "James".to_owned(),
                last_name: "Lin".to_owned(),
                password_hash: PasswordHash::new(ValidatedPassword::new_unchecked(PASSWORD), 4)
                    .unwrap(),
            },
            &connection,
        )
        .unwrap();
        create_api_key(user.id, "secret", &connection).unwrap();

        connection
    }

    fn log_in(username: &str, password: &str, connection: &Connection) -> Result<User, Error> {
        find_log_in_user(username, connection).and_then(|user| check_credentials(user, password))
    }

    #[test]
    fn check_credentials_succeeds() {
        let connection = get_test_connection();

        let user = log_in("jamesl", PASSWORD, &connection).unwrap();

        assert_eq!(user.username, "jamesl");
    }

    #[test]
    fn check_credentials_fails_on_wrong_password() {
        let connection = get_test_connection();

        let result = log_in("jamesl", "wrongpassword", &connection);

        assert_eq!(result, Err(Error::InvalidCredentials));
    }

    #[test]
    fn find_log_in_user_fails_on_unknown_user() {
        let connection = get_test_connection();

        let result = find_log_in_user("nobody", &connection);

        assert_eq!(result, Err(Error::InvalidCredentials));
    }

    #[test]
    fn check_credentials_fails_on_disabled_account() {
        let connection = get_test_connection();
        let user = log_in("jamesl", PASSWORD, &connection).unwrap();
        set_user_active(user.id, false, &connection).unwrap();

        let result = log_in("jamesl", PASSWORD, &connection);

        assert_eq!(result, Err(Error::AccountDisabled));
    }

    #[test]
    fn check_credentials_works_after_connection_is_closed() {
        let connection = get_test_connection();
        let user = find_log_in_user("jamesl", &connection).unwrap();
        drop(connection);

        assert_eq!(check_credentials(user.clone(), PASSWORD), Ok(user));
    }

    #[tokio::test]
    async fn authenticate_returns_api_key() {
        let state = AccountState {
            api_key_secret: "secret".to_owned(),
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let Json(body) = authenticate_user(
            State(state),
            Json(LogInRequest {
                username: "jamesl".to_owned(),
                password: PASSWORD.to_owned(),
            }),
        )
        .await
        .unwrap();

        assert!(body.success);
        assert_eq!(body.username, "jamesl");
        assert_eq!(body.first_name, "James");
        assert_eq!(body.last_name, "Lin");
        assert_eq!(body.api_key.len(), 64);
    }
}
