use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    Error,
    expense::{
        ExpenseId, core::get_expense, payload::ExpenseResponse, state::ExpenseState,
    },
    timezone::get_timezone,
    user::UserID,
};

/// A route handler for reading a single expense owned by the authenticated user.
///
/// # Errors
/// Returns a 404 error if the user has no expense with the ID `expense_id`.
pub async fn get_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Json<ExpenseResponse>, Error> {
    let timezone = get_timezone(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = get_expense(user_id, expense_id, &connection)?;

    Ok(Json(ExpenseResponse::new(expense, timezone)))
}
