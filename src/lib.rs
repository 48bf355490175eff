//! Expense Ledger keeps a ledger of dated expenses and the recurring expenses
//! that generate them.
//!
//! A recurring expense (e.g., rent, a phone plan) is a rule with a start date,
//! an interval and an occurrence budget. Saving a rule materializes its
//! occurrences as concrete expenses in the ledger, and changing or removing
//! the rule regenerates or deletes them without losing the history that has
//! already happened.
//!
//! This library provides a JSON REST API over a SQLite database.

#![warn(missing_docs)]

use std::{fmt::Display, net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod currency;
mod database_id;
mod db;
mod endpoints;
mod expense;
mod logging;
mod recurring;
mod routing;
mod tag_set;
#[cfg(test)]
mod test_utils;
mod timezone;

pub use app_state::AppState;
pub use currency::{CurrencyCode, DEFAULT_CURRENCY};
pub use database_id::{ExpenseId, RecurringExpenseId};
pub use db::initialize as initialize_db;
pub use expense::{Expense, ExpenseData};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use recurring::{
    Expansion, ExpansionStatus, Interval, RecurringExpense, RecurringExpenseData, Truncation,
    create_recurring_expense, preview_recurring_expense, remove_recurring_expense,
    update_recurring_expense,
};
pub use routing::build_router;
pub use tag_set::TagSet;
pub use timezone::LedgerClock;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The step of a multi-statement write that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPhase {
    /// Starting the transaction.
    Begin,
    /// Inserting, replacing or deleting the recurring expense row.
    RuleWrite,
    /// Deleting the expenses generated by a recurring expense.
    EntryDelete,
    /// Inserting newly generated expenses.
    EntryInsert,
    /// Committing the transaction.
    Commit,
}

impl Display for TransactionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phase = match self {
            TransactionPhase::Begin => "begin",
            TransactionPhase::RuleWrite => "rule write",
            TransactionPhase::EntryDelete => "entry delete",
            TransactionPhase::EntryInsert => "entry insert",
            TransactionPhase::Commit => "commit",
        };

        f.write_str(phase)
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a recurring expense that does not exist
    #[error("tried to update a recurring expense that is not in the database")]
    UpdateMissingRecurringExpense,

    /// Tried to delete a recurring expense that does not exist
    #[error("tried to delete a recurring expense that is not in the database")]
    DeleteMissingRecurringExpense,

    /// Tried to update an expense that does not exist
    #[error("tried to update an expense that is not in the database")]
    UpdateMissingExpense,

    /// Tried to delete an expense that does not exist
    #[error("tried to delete an expense that is not in the database")]
    DeleteMissingExpense,

    /// Tried to edit or delete an expense that was generated by a recurring
    /// expense. These change only through their recurring expense.
    #[error(
        "expense {0} was generated by a recurring expense, change the recurring expense instead"
    )]
    RecurringExpenseEntry(ExpenseId),

    /// Tried to create a recurring expense with an ID that is already taken.
    #[error("a recurring expense with the ID {0} already exists")]
    DuplicateRecurringExpense(RecurringExpenseId),

    /// The client sent a recurring expense with a missing or malformed field.
    #[error("invalid recurring expense: {0}")]
    InvalidRecurringExpense(String),

    /// The client sent an expense with a missing or malformed field.
    #[error("invalid expense: {0}")]
    InvalidExpense(String),

    /// A currency was not a three letter, uppercase currency code.
    #[error("\"{0}\" is not a valid currency code, expected three uppercase letters such as USD")]
    InvalidCurrency(String),

    /// A write spanning several statements failed and was rolled back.
    #[error("transaction failed during {phase}: {error}")]
    TransactionFailed {
        /// The step that failed.
        phase: TransactionPhase,
        /// The underlying SQL error.
        error: rusqlite::Error,
    },

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound
            | Error::UpdateMissingRecurringExpense
            | Error::DeleteMissingRecurringExpense
            | Error::UpdateMissingExpense
            | Error::DeleteMissingExpense => StatusCode::NOT_FOUND,
            Error::RecurringExpenseEntry(_) | Error::DuplicateRecurringExpense(_) => {
                StatusCode::CONFLICT
            }
            Error::InvalidRecurringExpense(_)
            | Error::InvalidExpense(_)
            | Error::InvalidCurrency(_) => StatusCode::BAD_REQUEST,
            Error::TransactionFailed { .. }
            | Error::SqlError(_)
            | Error::InvalidTimezoneError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = match self {
            Error::InvalidTimezoneError(timezone) => format!(
                "Could not get local timezone \"{timezone}\". Check your server settings and \
                ensure the timezone has been set to valid, canonical timezone string"
            ),
            // Storage details are not intended to be shown to the client.
            error @ (Error::TransactionFailed { .. }
            | Error::SqlError(_)
            | Error::DatabaseLockError) => {
                tracing::error!("An unexpected error occurred: {}", error);
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => error.to_string(),
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}
