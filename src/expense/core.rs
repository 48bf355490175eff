//! Defines the ledger entry model and its database queries.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    currency::{CurrencyCode, currency_or_default},
    database_id::{ExpenseId, RecurringExpenseId, new_id},
    tag_set::TagSet,
};

// ============================================================================
// MODELS
// ============================================================================

/// The earliest year a ledger date may have.
///
/// Dates are stored as ISO 8601 text, which only sorts chronologically for
/// four digit, non-negative years.
pub const MIN_YEAR: i32 = 1;

/// The latest year a ledger date may have.
pub const MAX_YEAR: i32 = 9999;

/// Whether `date` can be stored and ordered in the ledger.
pub fn is_storable_date(date: Date) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

/// One concrete, dated line in the ledger.
///
/// An expense is either entered by hand (freestanding) or generated from a
/// [crate::recurring::RecurringExpense], in which case `recurring_id` points
/// back at the rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The rule that generated this expense, if any.
    ///
    /// This is a weak reference: deleting the rule may leave this pointing at
    /// a rule that no longer exists.
    pub recurring_id: Option<RecurringExpenseId>,
    /// A text description of what the expense was for.
    pub name: String,
    pub category: String,
    pub subcategory: Option<String>,
    /// The amount of money spent (negative) or earned (positive).
    pub amount: f64,
    /// The currency code of `amount`, e.g. "NZD".
    pub currency: String,
    /// When the expense happened, or will happen.
    pub date: Date,
    pub tags: TagSet,
}

/// The fields of a freestanding expense, as sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseData {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub amount: f64,
    /// Falls back to the configured default currency when empty.
    #[serde(default)]
    pub currency: Option<String>,
    /// Falls back to today when absent.
    #[serde(default)]
    pub date: Option<Date>,
    #[serde(default)]
    pub tags: TagSet,
}

impl ExpenseData {
    /// Check the fields a client may get wrong.
    ///
    /// # Errors
    /// Returns [Error::InvalidExpense] describing the first problem found.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidExpense("name cannot be empty".to_owned()));
        }

        if self.category.trim().is_empty() {
            return Err(Error::InvalidExpense("category cannot be empty".to_owned()));
        }

        if !self.amount.is_finite() {
            return Err(Error::InvalidExpense("amount must be a number".to_owned()));
        }

        if let Some(date) = self.date
            && !is_storable_date(date)
        {
            return Err(Error::InvalidExpense(format!(
                "date must be between the years {MIN_YEAR} and {MAX_YEAR}"
            )));
        }

        if let Some(currency) = self.currency.as_deref().map(str::trim)
            && !currency.is_empty()
        {
            CurrencyCode::new(currency)?;
        }

        Ok(())
    }

    fn into_expense(self, id: ExpenseId, default_currency: &CurrencyCode, today: Date) -> Expense {
        Expense {
            id,
            recurring_id: None,
            name: self.name.trim().to_owned(),
            category: self.category.trim().to_owned(),
            subcategory: self
                .subcategory
                .map(|subcategory| subcategory.trim().to_owned())
                .filter(|subcategory| !subcategory.is_empty()),
            amount: self.amount,
            currency: currency_or_default(self.currency, default_currency),
            date: self.date.unwrap_or(today),
            tags: self.tags,
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const EXPENSE_COLUMNS: &str =
    "id, recurring_id, name, category, subcategory, amount, currency, date, tags";

/// Create a freestanding expense.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_expense(
    data: ExpenseData,
    default_currency: &CurrencyCode,
    today: Date,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = data.into_expense(new_id(), default_currency, today);
    insert_expenses(std::slice::from_ref(&expense), connection)?;

    Ok(expense)
}

/// Insert `expenses` as they are, IDs and back-references included.
///
/// Callers that need all-or-nothing semantics should pass a transaction.
pub(crate) fn insert_expenses(
    expenses: &[Expense],
    connection: &Connection,
) -> Result<(), rusqlite::Error> {
    let mut statement = connection.prepare_cached(&format!(
        "INSERT INTO expense ({EXPENSE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
    ))?;

    for expense in expenses {
        statement.execute((
            expense.id,
            expense.recurring_id,
            &expense.name,
            &expense.category,
            &expense.subcategory,
            expense.amount,
            &expense.currency,
            expense.date,
            &expense.tags,
        ))?;
    }

    Ok(())
}

/// Retrieve an expense by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_expense(id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    connection
        .prepare(&format!("SELECT {EXPENSE_COLUMNS} FROM expense WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_expense_row)
        .map_err(|error| error.into())
}

/// Retrieve all expenses, most recent first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_all_expenses(connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense ORDER BY date DESC, name ASC"
        ))?
        .query_map([], map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the expenses generated by the recurring expense `recurring_id`,
/// in chronological order.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_expenses_by_recurring_id(
    recurring_id: RecurringExpenseId,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE recurring_id = :recurring_id \
             ORDER BY date ASC"
        ))?
        .query_map(&[(":recurring_id", &recurring_id)], map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Replace the fields of the freestanding expense `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingExpense] if `id` does not refer to an expense,
/// - [Error::RecurringExpenseEntry] if the expense belongs to a recurring expense,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_expense(
    id: ExpenseId,
    data: ExpenseData,
    default_currency: &CurrencyCode,
    today: Date,
    connection: &Connection,
) -> Result<Expense, Error> {
    ensure_freestanding(id, connection).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingExpense,
        error => error,
    })?;

    let expense = data.into_expense(id, default_currency, today);
    let rows_affected = connection.execute(
        "UPDATE expense
         SET name = ?1, category = ?2, subcategory = ?3, amount = ?4, currency = ?5, date = ?6, tags = ?7
         WHERE id = ?8 AND recurring_id IS NULL",
        (
            &expense.name,
            &expense.category,
            &expense.subcategory,
            expense.amount,
            &expense.currency,
            expense.date,
            &expense.tags,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingExpense);
    }

    Ok(expense)
}

/// Delete the freestanding expense `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingExpense] if `id` does not refer to an expense,
/// - [Error::RecurringExpenseEntry] if the expense belongs to a recurring expense,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_expense(id: ExpenseId, connection: &Connection) -> Result<(), Error> {
    ensure_freestanding(id, connection).map_err(|error| match error {
        Error::NotFound => Error::DeleteMissingExpense,
        error => error,
    })?;

    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND recurring_id IS NULL",
        [id],
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingExpense);
    }

    Ok(())
}

/// Expenses generated from a recurring expense only change through their rule.
fn ensure_freestanding(id: ExpenseId, connection: &Connection) -> Result<(), Error> {
    let recurring_id: Option<RecurringExpenseId> = connection.query_row(
        "SELECT recurring_id FROM expense WHERE id = ?1",
        [id],
        |row| row.get(0),
    )?;

    match recurring_id {
        Some(_) => Err(Error::RecurringExpenseEntry(id)),
        None => Ok(()),
    }
}

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    // No foreign key on `recurring_id`, past expenses outlive their rule.
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id BLOB PRIMARY KEY,
                recurring_id BLOB,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                subcategory TEXT,
                amount REAL NOT NULL,
                currency TEXT NOT NULL,
                date TEXT NOT NULL,
                tags TEXT
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_recurring_id_date ON expense(recurring_id, date)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_date ON expense(date)",
        (),
    )?;

    Ok(())
}

/// Map a database row to an Expense.
fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        recurring_id: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        subcategory: row.get(4)?,
        amount: row.get(5)?,
        currency: row.get(6)?,
        date: row.get(7)?,
        tags: row.get(8)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod test_utils {
    use time::Date;

    use crate::{database_id::new_id, expense::Expense, tag_set::TagSet};

    use super::ExpenseData;

    pub fn expense_data(name: &str, amount: f64, date: Date) -> ExpenseData {
        ExpenseData {
            name: name.to_owned(),
            category: "Food".to_owned(),
            subcategory: None,
            amount,
            currency: None,
            date: Some(date),
            tags: TagSet::new(),
        }
    }

    pub fn generated_expense(recurring_id: uuid::Uuid, date: Date) -> Expense {
        Expense {
            id: new_id(),
            recurring_id: Some(recurring_id),
            name: "Rent".to_owned(),
            category: "Housing".to_owned(),
            subcategory: None,
            amount: -500.0,
            currency: "NZD".to_owned(),
            date,
            tags: TagSet::new(),
        }
    }
}
