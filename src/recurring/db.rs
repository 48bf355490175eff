//! Storage for recurring expenses and the expenses they generate.
//!
//! Creating, updating and removing a recurring expense each touch the rule row
//! and its generated expenses. These run in a single SQLite transaction so that
//! a reader never sees a rule alongside another version's expenses.

use rusqlite::{Connection, Row, Transaction, TransactionBehavior};
use time::Date;

use crate::{
    Error, TransactionPhase,
    currency::CurrencyCode,
    database_id::{RecurringExpenseId, new_id},
    expense::insert_expenses,
    recurring::{
        expand::{Expansion, expand},
        models::{ChangeScope, RecurringExpense, RecurringExpenseData},
    },
};

const RECURRING_EXPENSE_COLUMNS: &str =
    "id, name, amount, currency, category, start_date, interval, occurrences, tags";

/// Create a recurring expense and the expenses it generates.
///
/// The rule keeps `data.id` if given, otherwise it gets a new ID. An empty
/// currency is replaced with `default_currency`. Expenses are generated from
/// the start date without skipping any that have already happened.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateRecurringExpense] if `data.id` is already taken,
/// - or [Error::TransactionFailed] naming the step that failed.
///
/// Nothing is stored in either case.
pub fn create_recurring_expense(
    data: RecurringExpenseData,
    default_currency: &CurrencyCode,
    today: Date,
    connection: &Connection,
) -> Result<(RecurringExpense, Expansion), Error> {
    let id = data.id.unwrap_or_else(new_id);
    let recurring_expense = data.into_recurring_expense(id, default_currency);

    let transaction = begin(connection)?;

    transaction
        .execute(
            &format!(
                "INSERT INTO recurring_expense ({RECURRING_EXPENSE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            (
                recurring_expense.id,
                &recurring_expense.name,
                recurring_expense.amount,
                &recurring_expense.currency,
                &recurring_expense.category,
                recurring_expense.start_date,
                &recurring_expense.interval,
                recurring_expense.occurrences,
                &recurring_expense.tags,
            ),
        )
        .map_err(|error| match error {
            // Handle primary key constraint violation
            rusqlite::Error::SqliteFailure(error, _) if error.extended_code == 1555 => {
                Error::DuplicateRecurringExpense(recurring_expense.id)
            }
            error => failed_at(TransactionPhase::RuleWrite)(error),
        })?;

    let expansion = expand(&recurring_expense, false, today);
    insert_expenses(&expansion.expenses, &transaction)
        .map_err(failed_at(TransactionPhase::EntryInsert))?;

    commit(transaction)?;

    tracing::debug!(
        "Created recurring expense {} with {} expense(s)",
        recurring_expense.id,
        expansion.expenses.len()
    );

    Ok((recurring_expense, expansion))
}

/// Replace the recurring expense `id` with `data` and regenerate its expenses.
///
/// The ID cannot change, so `data.id` is ignored. With [ChangeScope::All],
/// every expense of the rule is deleted and regenerated from the start date.
/// With [ChangeScope::FutureOnly], expenses dated on or before `today` are
/// kept as they are and only occurrences after `today` are regenerated.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingRecurringExpense] if `id` does not refer to a
///   recurring expense, in which case nothing is changed,
/// - or [Error::TransactionFailed] naming the step that failed, in which case
///   nothing is changed either.
pub fn update_recurring_expense(
    id: RecurringExpenseId,
    data: RecurringExpenseData,
    scope: ChangeScope,
    default_currency: &CurrencyCode,
    today: Date,
    connection: &Connection,
) -> Result<(RecurringExpense, Expansion), Error> {
    let recurring_expense = data.into_recurring_expense(id, default_currency);

    let transaction = begin(connection)?;

    let rows_affected = transaction
        .execute(
            "UPDATE recurring_expense
             SET name = ?1, amount = ?2, currency = ?3, category = ?4, start_date = ?5,
                 interval = ?6, occurrences = ?7, tags = ?8
             WHERE id = ?9",
            (
                &recurring_expense.name,
                recurring_expense.amount,
                &recurring_expense.currency,
                &recurring_expense.category,
                recurring_expense.start_date,
                &recurring_expense.interval,
                recurring_expense.occurrences,
                &recurring_expense.tags,
                id,
            ),
        )
        .map_err(failed_at(TransactionPhase::RuleWrite))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingRecurringExpense);
    }

    let deleted = delete_generated_expenses(id, scope, today, &transaction)?;

    let expansion = expand(&recurring_expense, scope == ChangeScope::FutureOnly, today);
    insert_expenses(&expansion.expenses, &transaction)
        .map_err(failed_at(TransactionPhase::EntryInsert))?;

    commit(transaction)?;

    tracing::debug!(
        "Updated recurring expense {id} ({scope:?}): replaced {deleted} expense(s) with {}",
        expansion.expenses.len()
    );

    Ok((recurring_expense, expansion))
}

/// Delete the recurring expense `id` and the expenses it generated.
///
/// With [ChangeScope::FutureOnly], expenses dated on or before `today` are
/// kept and still refer to the deleted rule.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingRecurringExpense] if `id` does not refer to a
///   recurring expense,
/// - or [Error::TransactionFailed] naming the step that failed.
pub fn delete_recurring_expense(
    id: RecurringExpenseId,
    scope: ChangeScope,
    today: Date,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = begin(connection)?;

    let rows_affected = transaction
        .execute("DELETE FROM recurring_expense WHERE id = ?1", [id])
        .map_err(failed_at(TransactionPhase::RuleWrite))?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRecurringExpense);
    }

    let deleted = delete_generated_expenses(id, scope, today, &transaction)?;

    commit(transaction)?;

    tracing::debug!("Deleted recurring expense {id} ({scope:?}) and {deleted} expense(s)");

    Ok(())
}

/// Retrieve a recurring expense by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a recurring expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_recurring_expense(
    id: RecurringExpenseId,
    connection: &Connection,
) -> Result<RecurringExpense, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_EXPENSE_COLUMNS} FROM recurring_expense WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_recurring_expense_row)
        .map_err(|error| error.into())
}

/// Retrieve all recurring expenses, ordered by name.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_all_recurring_expenses(connection: &Connection) -> Result<Vec<RecurringExpense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_EXPENSE_COLUMNS} FROM recurring_expense ORDER BY name ASC, start_date ASC"
        ))?
        .query_map([], map_recurring_expense_row)?
        .map(|maybe_recurring_expense| maybe_recurring_expense.map_err(|error| error.into()))
        .collect()
}

/// Create the recurring expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_recurring_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_expense (
                id BLOB PRIMARY KEY,
                name TEXT NOT NULL,
                amount REAL NOT NULL,
                currency TEXT NOT NULL,
                category TEXT NOT NULL,
                start_date TEXT NOT NULL,
                interval TEXT NOT NULL,
                occurrences INTEGER NOT NULL CHECK (occurrences >= 0),
                tags TEXT
            );",
        (),
    )?;

    Ok(())
}

fn map_recurring_expense_row(row: &Row) -> Result<RecurringExpense, rusqlite::Error> {
    Ok(RecurringExpense {
        id: row.get(0)?,
        name: row.get(1)?,
        amount: row.get(2)?,
        currency: row.get(3)?,
        category: row.get(4)?,
        start_date: row.get(5)?,
        interval: row.get(6)?,
        occurrences: row.get(7)?,
        tags: row.get(8)?,
    })
}

/// Start a transaction that holds the database write lock until it ends, so
/// that two changes to the same rule cannot interleave.
///
/// The transaction rolls back when dropped without [commit].
fn begin(connection: &Connection) -> Result<Transaction<'_>, Error> {
    Transaction::new_unchecked(connection, TransactionBehavior::Immediate)
        .map_err(failed_at(TransactionPhase::Begin))
}

fn commit(transaction: Transaction) -> Result<(), Error> {
    transaction
        .commit()
        .map_err(failed_at(TransactionPhase::Commit))
}

type RowsAffected = usize;

fn delete_generated_expenses(
    recurring_id: RecurringExpenseId,
    scope: ChangeScope,
    today: Date,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let result = match scope {
        ChangeScope::All => connection.execute(
            "DELETE FROM expense WHERE recurring_id = ?1",
            [recurring_id],
        ),
        ChangeScope::FutureOnly => connection.execute(
            "DELETE FROM expense WHERE recurring_id = ?1 AND date > ?2",
            (recurring_id, today),
        ),
    };

    result.map_err(failed_at(TransactionPhase::EntryDelete))
}

fn failed_at(phase: TransactionPhase) -> impl FnOnce(rusqlite::Error) -> Error {
    move |error| {
        tracing::error!("Recurring expense {phase} failed, rolling back: {error}");
        Error::TransactionFailed { phase, error }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Barrier},
        thread,
        time::Duration,
    };

    use rusqlite::Connection;
    use time::{Date, Month, macros::date};

    use crate::{
        Error, TransactionPhase,
        currency::CurrencyCode,
        database_id::new_id,
        db::initialize,
        expense::{Expense, ExpenseData, create_expense, get_all_expenses, get_expenses_by_recurring_id},
        recurring::{Interval, RecurringExpense, RecurringExpenseData, models::ChangeScope},
        tag_set::TagSet,
    };

    use super::{
        create_recurring_expense, delete_recurring_expense, get_all_recurring_expenses,
        get_recurring_expense, update_recurring_expense,
    };

    const TODAY: Date = date!(2026 - 01 - 10);

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn currency() -> CurrencyCode {
        CurrencyCode::new_unchecked("NZD")
    }

    fn daily_data(amount: f64, occurrences: u32) -> RecurringExpenseData {
        RecurringExpenseData {
            id: None,
            name: "Coffee".to_owned(),
            amount,
            currency: None,
            category: "Food".to_owned(),
            start_date: date!(2026 - 01 - 01),
            interval: Interval::Daily,
            occurrences,
            tags: TagSet::from_iter(["habit"]),
        }
    }

    fn create(data: RecurringExpenseData, connection: &Connection) -> RecurringExpense {
        create_recurring_expense(data, &currency(), TODAY, connection)
            .expect("Could not create recurring expense")
            .0
    }

    fn expenses_on_or_before(
        recurring_id: uuid::Uuid,
        date: Date,
        connection: &Connection,
    ) -> Vec<Expense> {
        get_expenses_by_recurring_id(recurring_id, connection)
            .unwrap()
            .into_iter()
            .filter(|expense| expense.date <= date)
            .collect()
    }

    #[test]
    fn create_stores_rule_and_generated_expenses() {
        let connection = get_test_connection();

        let (rule, expansion) =
            create_recurring_expense(daily_data(-4.5, 5), &currency(), TODAY, &connection)
                .expect("Could not create recurring expense");

        assert_eq!(rule.currency, "NZD");
        assert_eq!(get_recurring_expense(rule.id, &connection), Ok(rule.clone()));
        let stored = get_expenses_by_recurring_id(rule.id, &connection).unwrap();
        assert_eq!(stored, expansion.expenses);
        assert_eq!(
            stored.iter().map(|expense| expense.date).collect::<Vec<_>>(),
            [
                date!(2026 - 01 - 01),
                date!(2026 - 01 - 02),
                date!(2026 - 01 - 03),
                date!(2026 - 01 - 04),
                date!(2026 - 01 - 05),
            ]
        );
    }

    #[test]
    fn create_keeps_client_supplied_id() {
        let connection = get_test_connection();
        let id = new_id();

        let rule = create(
            RecurringExpenseData {
                id: Some(id),
                ..daily_data(-4.5, 2)
            },
            &connection,
        );

        assert_eq!(rule.id, id);
    }

    #[test]
    fn create_with_duplicate_id_stores_nothing() {
        let connection = get_test_connection();
        let rule = create(daily_data(-4.5, 2), &connection);

        let result = create_recurring_expense(
            RecurringExpenseData {
                id: Some(rule.id),
                ..daily_data(-9.0, 7)
            },
            &currency(),
            TODAY,
            &connection,
        );

        assert_eq!(result, Err(Error::DuplicateRecurringExpense(rule.id)));
        assert_eq!(get_recurring_expense(rule.id, &connection), Ok(rule.clone()));
        assert_eq!(get_expenses_by_recurring_id(rule.id, &connection).unwrap().len(), 2);
    }

    #[test]
    fn create_open_ended_rule_stores_no_expenses() {
        let connection = get_test_connection();

        let rule = create(daily_data(-4.5, 0), &connection);

        assert_eq!(get_recurring_expense(rule.id, &connection), Ok(rule.clone()));
        assert!(get_expenses_by_recurring_id(rule.id, &connection).unwrap().is_empty());
    }

    #[test]
    fn update_future_only_keeps_past_expenses() {
        let connection = get_test_connection();
        let rule = create(daily_data(-4.5, 20), &connection);
        let past_before = expenses_on_or_before(rule.id, TODAY, &connection);
        assert_eq!(past_before.len(), 10);

        let (updated, expansion) = update_recurring_expense(
            rule.id,
            daily_data(-6.0, 20),
            ChangeScope::FutureOnly,
            &currency(),
            TODAY,
            &connection,
        )
        .expect("Could not update recurring expense");

        assert_eq!(updated.id, rule.id);
        assert_eq!(get_recurring_expense(rule.id, &connection), Ok(updated));
        assert_eq!(expenses_on_or_before(rule.id, TODAY, &connection), past_before);

        let all = get_expenses_by_recurring_id(rule.id, &connection).unwrap();
        let future: Vec<Expense> = all.into_iter().filter(|expense| expense.date > TODAY).collect();
        assert_eq!(future, expansion.expenses);
        assert_eq!(future.len(), 10);
        assert!(future.iter().all(|expense| expense.amount == -6.0));
        assert_eq!(future[0].date, date!(2026 - 01 - 11));
    }

    #[test]
    fn update_all_replaces_every_expense() {
        let connection = get_test_connection();
        let rule = create(daily_data(-4.5, 20), &connection);
        let old_ids: Vec<_> = get_expenses_by_recurring_id(rule.id, &connection)
            .unwrap()
            .into_iter()
            .map(|expense| expense.id)
            .collect();

        update_recurring_expense(
            rule.id,
            daily_data(-6.0, 3),
            ChangeScope::All,
            &currency(),
            TODAY,
            &connection,
        )
        .expect("Could not update recurring expense");

        let got = get_expenses_by_recurring_id(rule.id, &connection).unwrap();
        assert_eq!(got.len(), 3);
        assert!(got.iter().all(|expense| !old_ids.contains(&expense.id)));
        assert!(got.iter().all(|expense| expense.amount == -6.0));
        assert_eq!(got[0].date, date!(2026 - 01 - 01));
    }

    #[test]
    fn update_ignores_id_in_data() {
        let connection = get_test_connection();
        let rule = create(daily_data(-4.5, 2), &connection);

        let (updated, _) = update_recurring_expense(
            rule.id,
            RecurringExpenseData {
                id: Some(new_id()),
                ..daily_data(-1.0, 2)
            },
            ChangeScope::All,
            &currency(),
            TODAY,
            &connection,
        )
        .unwrap();

        assert_eq!(updated.id, rule.id);
        assert_eq!(get_all_recurring_expenses(&connection).unwrap(), [updated]);
    }

    #[test]
    fn update_missing_rule_changes_nothing() {
        let connection = get_test_connection();
        let rule = create(daily_data(-4.5, 3), &connection);
        let expenses_before = get_all_expenses(&connection).unwrap();

        let result = update_recurring_expense(
            new_id(),
            daily_data(-6.0, 3),
            ChangeScope::All,
            &currency(),
            TODAY,
            &connection,
        );

        assert_eq!(result, Err(Error::UpdateMissingRecurringExpense));
        assert_eq!(get_recurring_expense(rule.id, &connection), Ok(rule));
        assert_eq!(get_all_expenses(&connection).unwrap(), expenses_before);
    }

    #[test]
    fn failed_insert_rolls_back_rule_update() {
        let connection = get_test_connection();
        let rule = create(daily_data(-4.5, 5), &connection);
        let expenses_before = get_expenses_by_recurring_id(rule.id, &connection).unwrap();
        connection
            .execute(
                "CREATE TRIGGER fail_expense_insert BEFORE INSERT ON expense
                 BEGIN SELECT RAISE(ABORT, 'simulated insert failure'); END",
                (),
            )
            .unwrap();

        let result = update_recurring_expense(
            rule.id,
            daily_data(-99.0, 5),
            ChangeScope::All,
            &currency(),
            TODAY,
            &connection,
        );

        assert!(matches!(
            result,
            Err(Error::TransactionFailed {
                phase: TransactionPhase::EntryInsert,
                ..
            })
        ));
        assert_eq!(get_recurring_expense(rule.id, &connection), Ok(rule.clone()));
        assert_eq!(
            get_expenses_by_recurring_id(rule.id, &connection).unwrap(),
            expenses_before
        );
    }

    #[test]
    fn failed_insert_rolls_back_rule_creation() {
        let connection = get_test_connection();
        connection
            .execute(
                "CREATE TRIGGER fail_expense_insert BEFORE INSERT ON expense
                 BEGIN SELECT RAISE(ABORT, 'simulated insert failure'); END",
                (),
            )
            .unwrap();
        let id = new_id();

        let result = create_recurring_expense(
            RecurringExpenseData {
                id: Some(id),
                ..daily_data(-4.5, 3)
            },
            &currency(),
            TODAY,
            &connection,
        );

        assert!(matches!(
            result,
            Err(Error::TransactionFailed {
                phase: TransactionPhase::EntryInsert,
                ..
            })
        ));
        assert_eq!(get_recurring_expense(id, &connection), Err(Error::NotFound));
    }

    fn fail_expense_deletes(connection: &Connection) {
        connection
            .execute(
                "CREATE TRIGGER fail_expense_delete BEFORE DELETE ON expense
                 BEGIN SELECT RAISE(ABORT, 'simulated delete failure'); END",
                (),
            )
            .unwrap();
    }

    #[test]
    fn failed_entry_delete_rolls_back_rule_update() {
        let connection = get_test_connection();
        let rule = create(daily_data(-1.0, 5), &connection);
        let expenses_before = get_expenses_by_recurring_id(rule.id, &connection).unwrap();
        fail_expense_deletes(&connection);

        let result = update_recurring_expense(
            rule.id,
            daily_data(-99.0, 5),
            ChangeScope::All,
            &currency(),
            TODAY,
            &connection,
        );

        assert!(matches!(
            result,
            Err(Error::TransactionFailed {
                phase: TransactionPhase::EntryDelete,
                ..
            })
        ));
        assert_eq!(get_recurring_expense(rule.id, &connection), Ok(rule.clone()));
        assert_eq!(
            get_expenses_by_recurring_id(rule.id, &connection).unwrap(),
            expenses_before
        );
    }

    #[test]
    fn failed_entry_delete_rolls_back_rule_removal() {
        let connection = get_test_connection();
        let rule = create(daily_data(-1.0, 20), &connection);
        let expenses_before = get_expenses_by_recurring_id(rule.id, &connection).unwrap();
        fail_expense_deletes(&connection);

        let result = delete_recurring_expense(rule.id, ChangeScope::FutureOnly, TODAY, &connection);

        assert!(matches!(
            result,
            Err(Error::TransactionFailed {
                phase: TransactionPhase::EntryDelete,
                ..
            })
        ));
        assert_eq!(get_recurring_expense(rule.id, &connection), Ok(rule.clone()));
        assert_eq!(
            get_expenses_by_recurring_id(rule.id, &connection).unwrap(),
            expenses_before
        );
    }

    #[test]
    fn expenses_in_year_one_sort_before_later_years() {
        let connection = get_test_connection();
        let rule = create(
            RecurringExpenseData {
                start_date: Date::from_calendar_date(1, Month::December, 30).unwrap(),
                interval: Interval::Yearly,
                ..daily_data(-1.0, 3)
            },
            &connection,
        );

        let years: Vec<i32> = get_expenses_by_recurring_id(rule.id, &connection)
            .unwrap()
            .into_iter()
            .map(|expense| expense.date.year())
            .collect();

        assert_eq!(years, [1, 2, 3]);
    }

    #[test]
    fn delete_future_only_orphans_past_expenses() {
        let connection = get_test_connection();
        let rule = create(daily_data(-4.5, 20), &connection);
        let past_before = expenses_on_or_before(rule.id, TODAY, &connection);

        delete_recurring_expense(rule.id, ChangeScope::FutureOnly, TODAY, &connection)
            .expect("Could not delete recurring expense");

        assert_eq!(get_recurring_expense(rule.id, &connection), Err(Error::NotFound));
        let remaining = get_expenses_by_recurring_id(rule.id, &connection).unwrap();
        assert_eq!(remaining, past_before);
        assert!(remaining.iter().all(|expense| expense.recurring_id == Some(rule.id)));
    }

    #[test]
    fn delete_all_removes_every_expense_but_not_freestanding_ones() {
        let connection = get_test_connection();
        let rule = create(daily_data(-4.5, 20), &connection);
        let freestanding = create_expense(
            ExpenseData {
                name: "Lunch".to_owned(),
                category: "Food".to_owned(),
                subcategory: None,
                amount: -12.0,
                currency: None,
                date: Some(TODAY),
                tags: TagSet::new(),
            },
            &currency(),
            TODAY,
            &connection,
        )
        .unwrap();

        delete_recurring_expense(rule.id, ChangeScope::All, TODAY, &connection)
            .expect("Could not delete recurring expense");

        assert!(get_expenses_by_recurring_id(rule.id, &connection).unwrap().is_empty());
        assert_eq!(get_all_expenses(&connection).unwrap(), [freestanding]);
    }

    #[test]
    fn delete_missing_rule_fails() {
        let connection = get_test_connection();

        let result = delete_recurring_expense(new_id(), ChangeScope::All, TODAY, &connection);

        assert_eq!(result, Err(Error::DeleteMissingRecurringExpense));
    }

    #[test]
    fn unrecognized_interval_in_stored_rule_still_updates() {
        let connection = get_test_connection();
        let rule = create(daily_data(-4.5, 3), &connection);

        let (_, expansion) = update_recurring_expense(
            rule.id,
            RecurringExpenseData {
                interval: Interval::from("fortnightly"),
                ..daily_data(-4.5, 3)
            },
            ChangeScope::All,
            &currency(),
            TODAY,
            &connection,
        )
        .unwrap();

        assert!(expansion.is_truncated());
        assert_eq!(
            get_recurring_expense(rule.id, &connection).unwrap().interval,
            Interval::Unrecognized("fortnightly".to_owned())
        );
        assert_eq!(get_expenses_by_recurring_id(rule.id, &connection).unwrap().len(), 1);
    }

    #[test]
    fn concurrent_updates_on_separate_connections_are_serialized() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("ledger.db");
        let connection = Connection::open(&path).unwrap();
        initialize(&connection).unwrap();
        let rule = create(daily_data(-1.0, 30), &connection);

        let threads = 4;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|thread_index| {
                let path = path.clone();
                let barrier = barrier.clone();

                thread::spawn(move || {
                    let connection = Connection::open(path).unwrap();
                    connection.busy_timeout(Duration::from_secs(30)).unwrap();
                    barrier.wait();

                    for round in 0..5 {
                        let amount = -((thread_index * 100 + round) as f64);
                        let scope = if round % 2 == 0 {
                            ChangeScope::All
                        } else {
                            ChangeScope::FutureOnly
                        };
                        update_recurring_expense(
                            rule.id,
                            daily_data(amount, 30),
                            scope,
                            &currency(),
                            TODAY,
                            &connection,
                        )
                        .expect("Could not update recurring expense");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let final_rule = get_recurring_expense(rule.id, &connection).unwrap();
        let future: Vec<Expense> = get_expenses_by_recurring_id(rule.id, &connection)
            .unwrap()
            .into_iter()
            .filter(|expense| expense.date > TODAY)
            .collect();

        assert_eq!(future.len(), 20);
        assert!(
            future
                .iter()
                .all(|expense| expense.amount == final_rule.amount),
            "future expenses do not match the final rule {final_rule:?}: {future:?}"
        );
        assert_eq!(get_expenses_by_recurring_id(rule.id, &connection).unwrap().len(), 30);
    }
}
