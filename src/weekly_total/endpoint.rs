//! Defines the endpoint for the weekly spending report.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::{StatusCode, header::ALLOW},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error, ErrorResponse, endpoints,
    expense::get_expenses,
    user::UserID,
    weekly_total::aggregation::{WeeklyTotal, aggregate_weekly_totals},
};

/// The state needed to build the weekly report.
#[derive(Debug, Clone)]
pub struct WeeklyTotalState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for WeeklyTotalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Summary figures for the weekly report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyTotalMeta {
    /// The number of weeks in the report.
    pub total_count: usize,
}

/// One week of the report as it is sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyTotalResponse {
    /// The figures for the week.
    #[serde(flatten)]
    pub total: WeeklyTotal,
    /// Weeks have no detail resource, so this is the URI of the report.
    pub resource_uri: String,
}

impl From<WeeklyTotal> for WeeklyTotalResponse {
    fn from(total: WeeklyTotal) -> Self {
        Self {
            total,
            resource_uri: endpoints::WEEKLY_TOTALS.to_owned(),
        }
    }
}

/// The body of the weekly report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyTotalList {
    /// Summary figures for `objects`.
    pub meta: WeeklyTotalMeta,
    /// One entry per week with expenses, earliest first.
    pub objects: Vec<WeeklyTotalResponse>,
}

/// A route handler that reports the authenticated user's spending per ISO week.
///
/// # Errors
/// Returns a 500 error if a stored expense has no date.
pub async fn get_weekly_totals_endpoint(
    State(state): State<WeeklyTotalState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<WeeklyTotalList>, Error> {
    let expenses = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        get_expenses(user_id, None, &connection)?
    };

    let objects: Vec<WeeklyTotalResponse> = aggregate_weekly_totals(&expenses)?
        .into_iter()
        .map(WeeklyTotalResponse::from)
        .collect();

    Ok(Json(WeeklyTotalList {
        meta: WeeklyTotalMeta {
            total_count: objects.len(),
        },
        objects,
    }))
}

/// A route handler for single weeks of the report, which responds to every method with
/// 405 Method Not Allowed.
pub async fn weekly_total_detail_endpoint() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(ALLOW, "")],
        Json(ErrorResponse::new(format!(
            "weeks cannot be read or changed individually, use GET {}",
            endpoints::WEEKLY_TOTALS
        ))),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Json,
        extract::State,
        http::{StatusCode, header::ALLOW},
    };
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::datetime;

    use crate::{
        Error,
        db::initialize,
        expense::{Expense, create_expense},
        user::test_utils::must_create_test_user,
        weekly_total::endpoint::{
            WeeklyTotalState, get_weekly_totals_endpoint, weekly_total_detail_endpoint,
        },
    };

    #[tokio::test]
    async fn reports_only_the_users_weeks() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = must_create_test_user("jamesl", &connection);
        let other_user = must_create_test_user("other", &connection);
        create_expense(
            user.id,
            Expense::build(Decimal::TEN, datetime!(2014 - 07 - 02 0:00 UTC), "mine"),
            &connection,
        )
        .unwrap();
        create_expense(
            other_user.id,
            Expense::build(Decimal::TEN, datetime!(2014 - 08 - 02 0:00 UTC), "theirs"),
            &connection,
        )
        .unwrap();
        let state = WeeklyTotalState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let Json(report) = get_weekly_totals_endpoint(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(report.meta.total_count, 1);
        assert_eq!(report.objects[0].total.week_number, 27);
        assert_eq!(report.objects[0].total.count, 1);
        assert_eq!(report.objects[0].resource_uri, "/api/v1/weeklytotal/");
    }

    #[tokio::test]
    async fn expense_without_date_is_an_error() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = must_create_test_user("jamesl", &connection);
        connection
            .execute(
                "INSERT INTO expense (user_id, date, description, amount) VALUES (?1, NULL, 'x', '1.00')",
                (user.id.as_i64(),),
            )
            .unwrap();
        let state = WeeklyTotalState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let result = get_weekly_totals_endpoint(State(state), Extension(user.id)).await;

        assert!(matches!(result, Err(Error::InvalidExpenseDate(_))));
    }

    #[tokio::test]
    async fn detail_is_method_not_allowed() {
        let response = weekly_total_detail_endpoint().await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "");
    }
}
