use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    currency::{CurrencyCode, currency_or_default},
    database_id::RecurringExpenseId,
    expense::{MAX_YEAR, MIN_YEAR, is_storable_date},
    recurring::interval::Interval,
    tag_set::TagSet,
    timezone::LedgerClock,
};

/// The largest occurrence budget a client may ask for, about 27 years of a daily rule.
pub const MAX_OCCURRENCES: u32 = 10_000;

/// A rule for an expense that repeats on a regular schedule (e.g., rent, a
/// phone plan), from which concrete [crate::expense::Expense]s are generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringExpense {
    pub id: RecurringExpenseId,
    pub name: String,
    /// The amount of each occurrence, negative for money spent.
    pub amount: f64,
    pub currency: String,
    pub category: String,
    /// The date of the first occurrence.
    pub start_date: Date,
    pub interval: Interval,
    /// The total number of occurrences, where zero means open-ended.
    pub occurrences: u32,
    pub tags: TagSet,
}

/// The fields of a recurring expense, as sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringExpenseData {
    /// Only honoured on creation. A new ID is generated when absent.
    #[serde(default)]
    pub id: Option<RecurringExpenseId>,
    pub name: String,
    pub amount: f64,
    /// Falls back to the configured default currency when empty.
    #[serde(default)]
    pub currency: Option<String>,
    pub category: String,
    pub start_date: Date,
    pub interval: Interval,
    #[serde(default)]
    pub occurrences: u32,
    #[serde(default)]
    pub tags: TagSet,
}

impl RecurringExpenseData {
    /// Check the fields a client may get wrong.
    ///
    /// Category and currency lists are managed elsewhere, so only the shape of
    /// those fields is checked here.
    ///
    /// # Errors
    /// Returns an [Error::InvalidRecurringExpense] or [Error::InvalidCurrency]
    /// describing the first problem found.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidRecurringExpense(
                "name cannot be empty".to_owned(),
            ));
        }

        if self.category.trim().is_empty() {
            return Err(Error::InvalidRecurringExpense(
                "category cannot be empty".to_owned(),
            ));
        }

        if !self.amount.is_finite() {
            return Err(Error::InvalidRecurringExpense(
                "amount must be a number".to_owned(),
            ));
        }

        if !is_storable_date(self.start_date) {
            return Err(Error::InvalidRecurringExpense(format!(
                "start_date must be between the years {MIN_YEAR} and {MAX_YEAR}"
            )));
        }

        if !self.interval.is_recognized() {
            return Err(Error::InvalidRecurringExpense(format!(
                "\"{}\" is not a valid interval, expected one of daily, weekly, monthly or yearly",
                self.interval
            )));
        }

        if self.occurrences > MAX_OCCURRENCES {
            return Err(Error::InvalidRecurringExpense(format!(
                "occurrences cannot be more than {MAX_OCCURRENCES}"
            )));
        }

        if let Some(currency) = self.currency.as_deref().map(str::trim)
            && !currency.is_empty()
        {
            CurrencyCode::new(currency)?;
        }

        Ok(())
    }

    /// Build the rule to store under `id`, filling in the default currency.
    pub(crate) fn into_recurring_expense(
        self,
        id: RecurringExpenseId,
        default_currency: &CurrencyCode,
    ) -> RecurringExpense {
        RecurringExpense {
            id,
            name: self.name.trim().to_owned(),
            amount: self.amount,
            currency: currency_or_default(self.currency, default_currency),
            category: self.category.trim().to_owned(),
            start_date: self.start_date,
            interval: self.interval,
            occurrences: self.occurrences,
            tags: self.tags,
        }
    }
}

/// Which of a rule's generated expenses a change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeScope {
    /// Every expense the rule generated, past and future.
    All,
    /// Only expenses dated after the cutover date. Past expenses are kept.
    FutureOnly,
}

impl ChangeScope {
    /// Interpret a client's "apply to all"/"remove all" flag.
    pub fn from_all_flag(all: bool) -> Self {
        if all {
            ChangeScope::All
        } else {
            ChangeScope::FutureOnly
        }
    }
}

/// Unified state for all recurring expense operations.
#[derive(Debug, Clone)]
pub struct RecurringExpenseState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub clock: LedgerClock,
    pub default_currency: CurrencyCode,
}

impl FromRef<AppState> for RecurringExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            clock: state.clock.clone(),
            default_currency: state.default_currency.clone(),
        }
    }
}
