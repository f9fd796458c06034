//! Builds the router that maps the API endpoints to their handlers.

use axum::{
    Router, middleware,
    routing::{any, get, post},
};

use crate::{
    AppState,
    account::{authenticate_user, register_user},
    auth::api_key_guard,
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, get_expense_endpoint,
        get_expenses_endpoint, update_expense_endpoint,
    },
    not_found::get_404_not_found,
    weekly_total::{get_weekly_totals_endpoint, weekly_total_detail_endpoint},
};

/// Return a router with all the app's routes.
///
/// Every route except registration, authentication and the weekly report detail route requires
/// an `Authorization: ApiKey <username>:<api_key>` header.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::AUTHENTICATE, post(authenticate_user))
        .route(endpoints::WEEKLY_TOTAL, any(weekly_total_detail_endpoint));

    let protected_routes = Router::new()
        .route(
            endpoints::EXPENSES,
            get(get_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(
            endpoints::EXPENSE,
            get(get_expense_endpoint)
                .put(update_expense_endpoint)
                .delete(delete_expense_endpoint),
        )
        .route(endpoints::WEEKLY_TOTALS, get(get_weekly_totals_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), api_key_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}
