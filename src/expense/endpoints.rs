//! Route handlers for reading and editing expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    currency::CurrencyCode,
    database_id::{ExpenseId, RecurringExpenseId},
    endpoints::{self, format_endpoint},
    expense::{
        Expense, ExpenseData, create_expense, delete_expense, get_all_expenses, get_expense,
        get_expenses_by_recurring_id, update_expense,
    },
    timezone::LedgerClock,
};

/// The state needed to read and edit expenses.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Supplies the default date for expenses entered without one.
    pub clock: LedgerClock,
    /// The currency for expenses entered without one.
    pub default_currency: CurrencyCode,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
            default_currency: state.default_currency.clone(),
        }
    }
}

/// Optional filters for listing expenses.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseQuery {
    /// Only list the expenses generated by this recurring expense.
    #[serde(default, alias = "recurringId")]
    pub recurring_id: Option<RecurringExpenseId>,
}

/// A route handler for listing expenses, newest first.
///
/// When filtering by recurring expense, the expenses are listed oldest first.
pub async fn list_expenses_endpoint(
    State(state): State<ExpenseState>,
    Query(query): Query<ExpenseQuery>,
) -> Result<Json<Vec<Expense>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expenses = match query.recurring_id {
        Some(recurring_id) => get_expenses_by_recurring_id(recurring_id, &connection)?,
        None => get_all_expenses(&connection)?,
    };

    Ok(Json(expenses))
}

/// A route handler for getting a single expense.
pub async fn get_expense_endpoint(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<ExpenseState>,
) -> Result<Json<Expense>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_expense(expense_id, &connection).map(Json)
}

/// A route handler for entering an expense by hand.
///
/// Responds with `201 Created` and the location of the new expense.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Json(data): Json<ExpenseData>,
) -> Result<Response, Error> {
    data.validate()?;
    let today = state.clock.today()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = create_expense(data, &state.default_currency, today, &connection)?;
    let location = format_endpoint(endpoints::EXPENSE, expense.id);

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(expense)).into_response())
}

/// A route handler for editing an expense that was entered by hand.
///
/// Expenses generated by a recurring expense are rejected with
/// `409 Conflict`, they change only through their recurring expense.
pub async fn update_expense_endpoint(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<ExpenseState>,
    Json(data): Json<ExpenseData>,
) -> Result<Json<Expense>, Error> {
    data.validate()?;
    let today = state.clock.today()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    update_expense(expense_id, data, &state.default_currency, today, &connection)
        .inspect_err(|error| tracing::debug!("Could not update expense {expense_id}: {error}"))
        .map(Json)
}

/// A route handler for deleting an expense that was entered by hand.
pub async fn delete_expense_endpoint(
    Path(expense_id): Path<ExpenseId>,
    State(state): State<ExpenseState>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_expense(expense_id, &connection)
        .inspect_err(|error| tracing::debug!("Could not delete expense {expense_id}: {error}"))?;

    Ok(StatusCode::NO_CONTENT)
}
