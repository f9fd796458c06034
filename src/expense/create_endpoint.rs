//! Defines the endpoint for creating a new expense.

use axum::{
    Extension, Json,
    extract::State,
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    expense::{
        core::create_expense,
        payload::{ExpensePayload, ExpenseResponse},
        state::ExpenseState,
    },
    timezone::get_timezone,
    user::UserID,
};

/// A route handler for creating a new expense owned by the authenticated user.
///
/// Responds with 201 Created, the URI of the new expense in the `Location` header, and the
/// expense in the body.
///
/// # Errors
/// Returns a 400 error if the payload is invalid.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Json(payload): Json<ExpensePayload>,
) -> Result<Response, Error> {
    let timezone = get_timezone(&state.local_timezone)?;
    let new_expense = payload.into_new_expense(timezone)?;

    let expense = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        create_expense(user_id, new_expense, &connection)?
    };

    tracing::debug!("User {user_id} created expense {}", expense.id);

    let body = ExpenseResponse::new(expense, timezone);

    Ok((
        StatusCode::CREATED,
        [(LOCATION, body.resource_uri.clone())],
        Json(body),
    )
        .into_response())
}
