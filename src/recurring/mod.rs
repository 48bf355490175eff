//! Recurring expenses are rules (e.g., rent every month) that generate dated
//! expenses in the ledger.
//!
//! The rule and its generated expenses are always written together: creating
//! a rule stores every occurrence, updating it regenerates them and removing
//! it deletes them. By default, expenses that have already happened are kept
//! on update and removal.

mod db;
mod endpoints;
mod expand;
mod interval;
mod lifecycle;
mod models;

pub use db::create_recurring_expense_table;
pub use endpoints::{
    create_recurring_expense_endpoint, delete_recurring_expense_endpoint,
    get_recurring_expense_endpoint, list_recurring_expenses_endpoint,
    preview_recurring_expense_endpoint, update_recurring_expense_endpoint,
};
pub use expand::{Expansion, ExpansionStatus, Truncation};
pub use interval::Interval;
pub use lifecycle::{
    create_recurring_expense, preview_recurring_expense, remove_recurring_expense,
    update_recurring_expense,
};
pub use models::{RecurringExpense, RecurringExpenseData};
