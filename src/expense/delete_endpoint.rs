use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error,
    expense::{ExpenseId, core::delete_expense, state::ExpenseState},
    user::UserID,
};

/// A route handler for deleting an expense owned by the authenticated user, responds with 204
/// No Content.
///
/// # Errors
/// Returns a 404 error if the user has no expense with the ID `expense_id`.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    match delete_expense(user_id, expense_id, &connection)? {
        0 => Err(Error::NotFound),
        _ => {
            tracing::debug!("User {user_id} deleted expense {expense_id}");
            Ok(StatusCode::NO_CONTENT)
        }
    }
}
