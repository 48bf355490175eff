//! Expenses are the dated lines of the ledger. They are either entered by hand
//! or generated by a recurring expense, and only the former can be edited
//! directly.

mod core;
mod endpoints;

pub use core::{
    Expense, ExpenseData, MAX_YEAR, MIN_YEAR, create_expense, create_expense_table,
    delete_expense, get_all_expenses, get_expense, get_expenses_by_recurring_id,
    is_storable_date, update_expense,
};
pub use endpoints::{
    create_expense_endpoint, delete_expense_endpoint, get_expense_endpoint,
    list_expenses_endpoint, update_expense_endpoint,
};

pub(crate) use core::insert_expenses;
