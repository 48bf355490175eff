//! Route handlers for managing recurring expenses.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    Error,
    database_id::RecurringExpenseId,
    endpoints::{self, format_endpoint},
    recurring::{
        db::{get_all_recurring_expenses, get_recurring_expense},
        expand::Expansion,
        lifecycle::{
            create_recurring_expense, preview_recurring_expense, remove_recurring_expense,
            update_recurring_expense,
        },
        models::{RecurringExpense, RecurringExpenseData, RecurringExpenseState},
    },
};

/// A recurring expense together with the expenses generated for it.
#[derive(Debug, Serialize)]
pub struct RecurringExpenseResponse {
    /// The recurring expense as stored.
    pub recurring_expense: RecurringExpense,
    #[serde(flatten)]
    pub expansion: Expansion,
}

/// Query parameters for updating a recurring expense.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateQuery {
    /// Regenerate past expenses as well as future ones.
    #[serde(default, alias = "updateAll", deserialize_with = "deserialize_flag")]
    pub update_all: bool,
}

/// Query parameters for deleting a recurring expense.
#[derive(Debug, Default, Deserialize)]
pub struct RemoveQuery {
    /// Delete past expenses as well as future ones.
    #[serde(default, alias = "removeAll", deserialize_with = "deserialize_flag")]
    pub remove_all: bool,
}

/// Query parameters for previewing a recurring expense.
#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    /// Skip the occurrences that have already happened.
    #[serde(default, alias = "fastForward", deserialize_with = "deserialize_flag")]
    pub fast_forward: bool,
}

/// Parse a query flag written as "1", "t", "T", "TRUE", "true" or "True", or
/// as one of their false counterparts.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl serde::de::Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a boolean such as true, false, 1 or 0")
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            match value {
                "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
                "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
                _ => Err(E::invalid_value(serde::de::Unexpected::Str(value), &self)),
            }
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

/// A route handler for listing recurring expenses by name.
pub async fn list_recurring_expenses_endpoint(
    State(state): State<RecurringExpenseState>,
) -> Result<Json<Vec<RecurringExpense>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_all_recurring_expenses(&connection).map(Json)
}

/// A route handler for getting a single recurring expense.
pub async fn get_recurring_expense_endpoint(
    Path(recurring_expense_id): Path<RecurringExpenseId>,
    State(state): State<RecurringExpenseState>,
) -> Result<Json<RecurringExpense>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_recurring_expense(recurring_expense_id, &connection).map(Json)
}

/// A route handler for creating a recurring expense and its expenses.
///
/// Responds with `201 Created` and the location of the new recurring expense.
pub async fn create_recurring_expense_endpoint(
    State(state): State<RecurringExpenseState>,
    Json(data): Json<RecurringExpenseData>,
) -> Result<Response, Error> {
    data.validate()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let (recurring_expense, expansion) =
        create_recurring_expense(data, &state.clock, &state.default_currency, &connection)?;

    tracing::info!(
        "Created recurring expense {} with {} expense(s)",
        recurring_expense.id,
        expansion.expenses.len()
    );

    let location = format_endpoint(endpoints::RECURRING_EXPENSE, recurring_expense.id);

    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(RecurringExpenseResponse {
            recurring_expense,
            expansion,
        }),
    )
        .into_response())
}

/// A route handler for replacing a recurring expense.
///
/// Set `update_all` to regenerate every expense, otherwise expenses up to and
/// including today keep their old values.
pub async fn update_recurring_expense_endpoint(
    Path(recurring_expense_id): Path<RecurringExpenseId>,
    Query(query): Query<UpdateQuery>,
    State(state): State<RecurringExpenseState>,
    Json(data): Json<RecurringExpenseData>,
) -> Result<Json<RecurringExpenseResponse>, Error> {
    data.validate()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let (recurring_expense, expansion) = update_recurring_expense(
        recurring_expense_id,
        data,
        query.update_all,
        &state.clock,
        &state.default_currency,
        &connection,
    )?;

    Ok(Json(RecurringExpenseResponse {
        recurring_expense,
        expansion,
    }))
}

/// A route handler for deleting a recurring expense.
///
/// Set `remove_all` to delete every expense it generated, otherwise expenses
/// up to and including today are kept.
pub async fn delete_recurring_expense_endpoint(
    Path(recurring_expense_id): Path<RecurringExpenseId>,
    Query(query): Query<RemoveQuery>,
    State(state): State<RecurringExpenseState>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    remove_recurring_expense(
        recurring_expense_id,
        query.remove_all,
        &state.clock,
        &connection,
    )?;

    Ok(StatusCode::NO_CONTENT)
}

/// A route handler that shows the expenses a recurring expense would generate
/// without storing anything.
pub async fn preview_recurring_expense_endpoint(
    Query(query): Query<PreviewQuery>,
    State(state): State<RecurringExpenseState>,
    Json(data): Json<RecurringExpenseData>,
) -> Result<Json<RecurringExpenseResponse>, Error> {
    data.validate()?;

    let (recurring_expense, expansion) = preview_recurring_expense(
        data,
        query.fast_forward,
        &state.clock,
        &state.default_currency,
    )?;

    Ok(Json(RecurringExpenseResponse {
        recurring_expense,
        expansion,
    }))
}
