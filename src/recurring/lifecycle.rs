//! Create, update and remove recurring expenses on behalf of a client.
//!
//! Each operation reads the clock once and uses that date both as the cutover
//! between kept and regenerated expenses and as the fast-forward target.
//! Field validation is the caller's job, see [RecurringExpenseData::validate].

use rusqlite::Connection;

use crate::{
    Error,
    currency::CurrencyCode,
    database_id::{RecurringExpenseId, new_id},
    recurring::{
        db,
        expand::{Expansion, expand},
        models::{ChangeScope, RecurringExpense, RecurringExpenseData},
    },
    timezone::LedgerClock,
};

/// Create a recurring expense and store every expense it generates.
///
/// # Errors
/// Returns an [Error::DuplicateRecurringExpense] if the client supplied an ID
/// that is already taken, an [Error::InvalidTimezoneError] if the clock cannot
/// be read, or the storage error otherwise.
pub fn create_recurring_expense(
    data: RecurringExpenseData,
    clock: &LedgerClock,
    default_currency: &CurrencyCode,
    connection: &Connection,
) -> Result<(RecurringExpense, Expansion), Error> {
    let today = clock.today()?;

    db::create_recurring_expense(data, default_currency, today, connection).inspect_err(
        |error| match error {
            Error::DuplicateRecurringExpense(_) => {
                tracing::debug!("Could not create recurring expense: {error}");
            }
            error => tracing::error!("Could not create recurring expense: {error}"),
        },
    )
}

/// Replace the recurring expense `id` and regenerate its expenses.
///
/// If `update_all` is true, every expense of the rule is regenerated from the
/// start date. Otherwise expenses up to and including today are kept and only
/// later occurrences are regenerated.
///
/// # Errors
/// Returns an [Error::UpdateMissingRecurringExpense] if `id` does not refer to
/// a recurring expense, an [Error::InvalidTimezoneError] if the clock cannot
/// be read, or the storage error otherwise.
pub fn update_recurring_expense(
    id: RecurringExpenseId,
    data: RecurringExpenseData,
    update_all: bool,
    clock: &LedgerClock,
    default_currency: &CurrencyCode,
    connection: &Connection,
) -> Result<(RecurringExpense, Expansion), Error> {
    let today = clock.today()?;
    let scope = ChangeScope::from_all_flag(update_all);

    db::update_recurring_expense(id, data, scope, default_currency, today, connection)
        .inspect_err(|error| log_error("update", id, error))
}

/// Delete the recurring expense `id`.
///
/// If `remove_all` is true, every expense the rule generated is deleted too.
/// Otherwise only expenses dated after today are deleted, and earlier ones
/// stay in the ledger.
///
/// # Errors
/// Returns an [Error::DeleteMissingRecurringExpense] if `id` does not refer to
/// a recurring expense, an [Error::InvalidTimezoneError] if the clock cannot
/// be read, or the storage error otherwise.
pub fn remove_recurring_expense(
    id: RecurringExpenseId,
    remove_all: bool,
    clock: &LedgerClock,
    connection: &Connection,
) -> Result<(), Error> {
    let today = clock.today()?;
    let scope = ChangeScope::from_all_flag(remove_all);

    db::delete_recurring_expense(id, scope, today, connection)
        .inspect_err(|error| log_error("delete", id, error))
}

/// Show the expenses `data` would generate without storing anything.
///
/// # Errors
/// Returns an [Error::InvalidTimezoneError] if the clock cannot be read.
pub fn preview_recurring_expense(
    data: RecurringExpenseData,
    fast_forward: bool,
    clock: &LedgerClock,
    default_currency: &CurrencyCode,
) -> Result<(RecurringExpense, Expansion), Error> {
    let today = clock.today()?;
    let id = data.id.unwrap_or_else(new_id);
    let recurring_expense = data.into_recurring_expense(id, default_currency);
    let expansion = expand(&recurring_expense, fast_forward, today);

    Ok((recurring_expense, expansion))
}

fn log_error(operation: &str, id: RecurringExpenseId, error: &Error) {
    match error {
        Error::UpdateMissingRecurringExpense | Error::DeleteMissingRecurringExpense => {
            tracing::debug!("Could not {operation} recurring expense {id}: {error}");
        }
        error => {
            tracing::error!(
                "An unexpected error occurred while trying to {operation} recurring expense {id}: {error}"
            );
        }
    }
}
