//! Defines the endpoint for replacing an expense.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error,
    expense::{
        ExpenseId,
        core::update_expense,
        payload::{ExpensePayload, ExpenseResponse},
        state::ExpenseState,
    },
    timezone::get_timezone,
    user::UserID,
};

/// A route handler for replacing every field of an expense owned by the authenticated user.
///
/// Responds with 202 Accepted and the updated expense.
///
/// # Errors
/// Returns a 400 error if the payload is invalid, or a 404 error if the user has no expense with
/// the ID `expense_id`.
pub async fn update_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
    Json(payload): Json<ExpensePayload>,
) -> Result<(StatusCode, Json<ExpenseResponse>), Error> {
    let timezone = get_timezone(&state.local_timezone)?;
    let new_expense = payload.into_new_expense(timezone)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let expense = update_expense(user_id, expense_id, new_expense, &connection)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ExpenseResponse::new(expense, timezone)),
    ))
}
