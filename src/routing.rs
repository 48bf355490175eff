//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    AppState, endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, get_expense_endpoint,
        list_expenses_endpoint, update_expense_endpoint,
    },
    recurring::{
        create_recurring_expense_endpoint, delete_recurring_expense_endpoint,
        get_recurring_expense_endpoint, list_recurring_expenses_endpoint,
        preview_recurring_expense_endpoint, update_recurring_expense_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            endpoints::RECURRING_EXPENSES,
            get(list_recurring_expenses_endpoint).post(create_recurring_expense_endpoint),
        )
        .route(
            endpoints::RECURRING_EXPENSE_PREVIEW,
            post(preview_recurring_expense_endpoint),
        )
        .route(
            endpoints::RECURRING_EXPENSE,
            get(get_recurring_expense_endpoint)
                .put(update_recurring_expense_endpoint)
                .delete(delete_recurring_expense_endpoint),
        )
        .route(
            endpoints::EXPENSES,
            get(list_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(
            endpoints::EXPENSE,
            get(get_expense_endpoint)
                .put(update_expense_endpoint)
                .delete(delete_expense_endpoint),
        )
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested route does not exist" })),
    )
        .into_response()
}
