//! Database ID type definitions.

use uuid::Uuid;

/// The ID of a ledger entry (an [crate::expense::Expense]).
pub type ExpenseId = Uuid;

/// The ID of a rule that generates ledger entries (a [crate::recurring::RecurringExpense]).
pub type RecurringExpenseId = Uuid;

/// Generate a fresh, collision-resistant ID for a new row.
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}
