//! Turns a recurring expense into the concrete expenses it implies.

use serde::Serialize;
use time::Date;

use crate::{
    database_id::new_id,
    expense::Expense,
    recurring::{
        interval::{Interval, step},
        models::RecurringExpense,
    },
};

/// The expenses generated from a recurring expense.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expansion {
    /// The generated expenses in chronological order.
    pub expenses: Vec<Expense>,
    /// Whether `expenses` is everything the rule asked for.
    #[serde(flatten)]
    pub status: ExpansionStatus,
}

/// Whether an expansion generated everything the rule asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ExpansionStatus {
    Complete,
    /// Generation stopped early. The expenses generated before stopping are kept.
    Truncated(Truncation),
}

/// Why an expansion stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Truncation {
    /// The stored interval is not one that can be stepped.
    UnrecognizedInterval(String),
    /// The next occurrence would be past the largest supported date.
    DateOutOfRange,
}

impl Expansion {
    /// Whether generation stopped before the rule was exhausted.
    pub fn is_truncated(&self) -> bool {
        matches!(self.status, ExpansionStatus::Truncated(_))
    }
}

/// Generate the expenses for `recurring_expense`.
///
/// Occurrences start at the rule's start date. With `fast_forward`, the
/// occurrences that have already happened by `today` are skipped and, for a
/// rule with a non-zero occurrence budget, count against that budget. The
/// remaining budget is then emitted one interval apart.
///
/// A budget of zero (open-ended) generates no expenses at all.
///
/// Each expense gets a fresh ID and points back at `recurring_expense.id`.
pub fn expand(recurring_expense: &RecurringExpense, fast_forward: bool, today: Date) -> Expansion {
    let budget = recurring_expense.occurrences;
    let interval = &recurring_expense.interval;
    let mut cursor = recurring_expense.start_date;
    let mut remaining = budget;
    let mut expenses = Vec::new();

    if fast_forward {
        while cursor <= today && (budget == 0 || remaining > 0) {
            cursor = match step(cursor, interval) {
                Some(next) => next,
                None => return truncated(recurring_expense, expenses, cursor),
            };

            if budget > 0 {
                remaining -= 1;
            }
        }
    }

    for occurrence in 0..remaining {
        expenses.push(Expense {
            id: new_id(),
            recurring_id: Some(recurring_expense.id),
            name: recurring_expense.name.clone(),
            category: recurring_expense.category.clone(),
            subcategory: None,
            amount: recurring_expense.amount,
            currency: recurring_expense.currency.clone(),
            date: cursor,
            tags: recurring_expense.tags.clone(),
        });

        // No need to look past the last occurrence, which could be the max date.
        if occurrence + 1 == remaining {
            break;
        }

        cursor = match step(cursor, interval) {
            Some(next) => next,
            None => return truncated(recurring_expense, expenses, cursor),
        };
    }

    Expansion {
        expenses,
        status: ExpansionStatus::Complete,
    }
}

fn truncated(recurring_expense: &RecurringExpense, expenses: Vec<Expense>, cursor: Date) -> Expansion {
    let reason = match &recurring_expense.interval {
        Interval::Unrecognized(interval) => Truncation::UnrecognizedInterval(interval.clone()),
        _ => Truncation::DateOutOfRange,
    };

    tracing::warn!(
        "Stopped generating expenses for recurring expense {} at {cursor} after {} occurrence(s): {reason:?}",
        recurring_expense.id,
        expenses.len(),
    );

    Expansion {
        expenses,
        status: ExpansionStatus::Truncated(reason),
    }
}
