//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/v1/expense/{expense_id}/', use
//! [format_endpoint].

/// The route for creating an account.
pub const REGISTER: &str = "/api/v1/user/register/";
/// The route for exchanging a username and password for an API key.
pub const AUTHENTICATE: &str = "/api/v1/user/authenticate/";
/// The route for listing and creating expenses.
pub const EXPENSES: &str = "/api/v1/expense/";
/// The route for reading, replacing and deleting a single expense.
pub const EXPENSE: &str = "/api/v1/expense/{expense_id}/";
/// The route for the weekly spending report.
pub const WEEKLY_TOTALS: &str = "/api/v1/weeklytotal/";
/// The detail route of the weekly report, which allows no methods.
pub const WEEKLY_TOTAL: &str = "/api/v1/weeklytotal/{week_id}/";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// Paths without a parameter are returned unchanged.
///
/// ```ignore
/// assert_eq!(format_endpoint(EXPENSE, 42), "/api/v1/expense/42/");
/// ```
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| param_start + offset + 1);

    format!(
        "{}{id}{}",
        &endpoint_path[..param_start],
        &endpoint_path[param_end..]
    )
}
