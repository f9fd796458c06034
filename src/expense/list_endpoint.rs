//! Defines the endpoint for listing a user's expenses.

use axum::{Extension, Json, extract::State};
use axum_extra::extract::Query;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    expense::{
        DateRange, Expense,
        core::get_expenses,
        date_range::ExpenseListQuery,
        payload::ExpenseResponse,
        state::ExpenseState,
    },
    timezone::get_timezone,
    user::UserID,
};

/// Summary figures for a list of expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseListMeta {
    /// The number of expenses in the list.
    pub total_count: usize,
    /// The sum of the amounts of the expenses in the list.
    pub total_amount: Decimal,
    /// The mean amount per expense, zero for an empty list.
    pub average: Decimal,
}

impl ExpenseListMeta {
    /// Summarise `expenses`.
    pub fn new(expenses: &[Expense]) -> Self {
        let total_count = expenses.len();
        let total_amount: Decimal = expenses.iter().map(|expense| expense.amount).sum();
        let average = if total_count == 0 {
            Decimal::ZERO
        } else {
            total_amount / Decimal::from(total_count)
        };

        Self {
            total_count,
            total_amount,
            average,
        }
    }
}

/// The body of a response listing expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseList {
    /// Summary figures for `objects`.
    pub meta: ExpenseListMeta,
    /// The expenses, ordered by date.
    pub objects: Vec<ExpenseResponse>,
}

/// A route handler that lists the authenticated user's expenses, optionally filtered with
/// `date__range`.
///
/// # Errors
/// Returns a 400 error if the date range is malformed.
pub async fn get_expenses_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<ExpenseList>, Error> {
    let timezone = get_timezone(&state.local_timezone)?;
    let date_range = DateRange::from_query_values(&query.date_range, timezone)?;

    let expenses = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        get_expenses(user_id, date_range, &connection)?
    };

    let meta = ExpenseListMeta::new(&expenses);
    let objects = expenses
        .into_iter()
        .map(|expense| ExpenseResponse::new(expense, timezone))
        .collect();

    Ok(Json(ExpenseList { meta, objects }))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State};
    use axum_extra::extract::Query;
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::datetime;

    use crate::{
        Error,
        db::initialize,
        expense::{
            Expense, create_expense,
            date_range::ExpenseListQuery,
            list_endpoint::{ExpenseListMeta, get_expenses_endpoint},
            state::ExpenseState,
        },
        user::{UserID, test_utils::must_create_test_user},
    };

    fn get_test_state() -> (ExpenseState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = must_create_test_user("jamesl", &connection);

        for (amount, date) in [
            (Decimal::new(747, 0), datetime!(2014 - 06 - 29 12:00 UTC)),
            (Decimal::new(10, 0), datetime!(2014 - 07 - 01 12:00 UTC)),
            (Decimal::new(5, 0), datetime!(2014 - 07 - 06 12:00 UTC)),
        ] {
            create_expense(user.id, Expense::build(amount, date, "test"), &connection).unwrap();
        }

        let state = ExpenseState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Pacific/Auckland".to_owned(),
        };

        (state, user.id)
    }

    #[test]
    fn meta_of_empty_list() {
        let meta = ExpenseListMeta::new(&[]);

        assert_eq!(meta.total_count, 0);
        assert_eq!(meta.total_amount, Decimal::ZERO);
        assert_eq!(meta.average, Decimal::ZERO);
    }

    #[tokio::test]
    async fn lists_all_expenses_with_summary() {
        let (state, user_id) = get_test_state();

        let Json(list) = get_expenses_endpoint(
            State(state),
            Extension(user_id),
            Query(ExpenseListQuery::default()),
        )
        .await
        .unwrap();

        assert_eq!(list.meta.total_count, 3);
        assert_eq!(list.meta.total_amount.to_string(), "762.00");
        assert_eq!(list.meta.average, Decimal::new(254, 0));
        assert_eq!(list.objects.len(), 3);
        assert_eq!(list.objects[0].date, datetime!(2014 - 06 - 30 0:00 +12));
        assert_eq!(list.objects[0].date.offset(), time::macros::offset!(+12));
    }

    #[tokio::test]
    async fn filters_by_local_date_range() {
        let (state, user_id) = get_test_state();

        let Json(list) = get_expenses_endpoint(
            State(state),
            Extension(user_id),
            Query(ExpenseListQuery {
                date_range: vec!["2014-07-01,2014-07-07".to_owned()],
            }),
        )
        .await
        .unwrap();

        assert_eq!(list.meta.total_count, 2);
        assert_eq!(list.meta.total_amount.to_string(), "15.00");
    }

    #[tokio::test]
    async fn rejects_malformed_range() {
        let (state, user_id) = get_test_state();

        let result = get_expenses_endpoint(
            State(state),
            Extension(user_id),
            Query(ExpenseListQuery {
                date_range: vec!["2014-07-01".to_owned()],
            }),
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidDateRange(_))));
    }
}
