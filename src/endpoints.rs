//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/expenses/{expense_id}', use [format_endpoint].

/// The route to list and create recurring expenses.
pub const RECURRING_EXPENSES: &str = "/api/recurring_expenses";
/// The route to get, update and delete a single recurring expense.
pub const RECURRING_EXPENSE: &str = "/api/recurring_expenses/{recurring_expense_id}";
/// The route to preview the expenses a recurring expense would generate.
pub const RECURRING_EXPENSE_PREVIEW: &str = "/api/recurring_expenses/preview";
/// The route to list and create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to get, update and delete a single expense.
pub const EXPENSE: &str = "/api/expenses/{expense_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with a right brace, e.g.
/// '{expense_id}' in '/api/expenses/{expense_id}'. Only the first parameter
/// is replaced.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: impl std::fmt::Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
