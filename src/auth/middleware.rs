//! Authentication middleware that checks the API key sent with each request.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{api_key::get_api_key_for_user, credentials::ApiKeyCredentials},
    user::{UserID, get_user_by_username},
};

/// The state needed for the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The database connection for looking up users and their keys.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Check `credentials` against the stored API key and return the ID of the user they belong to.
///
/// # Errors
/// Returns [Error::InvalidApiKey] if the user does not exist or the key does not match, and
/// [Error::AccountDisabled] if the user has been deactivated.
pub fn authenticate_api_key(
    credentials: &ApiKeyCredentials,
    connection: &Connection,
) -> Result<UserID, Error> {
    let user = match get_user_by_username(&credentials.username, connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidApiKey),
        Err(error) => return Err(error),
    };

    let stored_key = match get_api_key_for_user(user.id, connection) {
        Ok(api_key) => api_key,
        Err(Error::NotFound) => return Err(Error::InvalidApiKey),
        Err(error) => return Err(error),
    };

    if stored_key.key != credentials.api_key {
        return Err(Error::InvalidApiKey);
    }

    if !user.is_active {
        return Err(Error::AccountDisabled);
    }

    Ok(user.id)
}

/// Middleware function that checks for a valid `Authorization: ApiKey <username>:<api_key>`
/// header.
///
/// The user ID is placed into the request extensions and the request executed normally if the
/// key is valid, otherwise an error response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>`
/// to receive the user ID.
pub async fn api_key_guard(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = match check_request(&state, &request) {
        Ok(user_id) => user_id,
        Err(error) => {
            tracing::debug!("Rejected request to {}: {error}", request.uri().path());
            return error.into_response();
        }
    };

    request.extensions_mut().insert(user_id);
    next.run(request).await
}

fn check_request(state: &AuthState, request: &Request) -> Result<UserID, Error> {
    let credentials = ApiKeyCredentials::from_headers(request.headers())?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    authenticate_api_key(&credentials, &connection)
}
