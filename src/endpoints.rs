//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/expenses/{expense_id}', use [format_endpoint].

use crate::database_id::DatabaseId;

/// The root route which redirects to the expenses page.
pub const ROOT: &str = "/";

/// The page for listing incomes.
pub const INCOMES_VIEW: &str = "/incomes";
/// The page for creating a new income.
pub const NEW_INCOME_VIEW: &str = "/incomes/new";
/// The page for editing an existing income.
pub const EDIT_INCOME_VIEW: &str = "/incomes/{income_id}/edit";
/// The page for listing expenses.
pub const EXPENSES_VIEW: &str = "/expenses";
/// The page for creating a new expense.
pub const NEW_EXPENSE_VIEW: &str = "/expenses/new";
/// The page for editing an existing expense.
pub const EDIT_EXPENSE_VIEW: &str = "/expenses/{expense_id}/edit";
/// The page for listing the invoices attached to an expense.
pub const EXPENSE_INVOICES_VIEW: &str = "/expenses/{expense_id}/invoices";
/// The page for listing service accounts.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page for creating a new service account.
pub const NEW_ACCOUNT_VIEW: &str = "/accounts/new";
/// The page for editing an existing service account.
pub const EDIT_ACCOUNT_VIEW: &str = "/accounts/{account_id}/edit";
/// The page for listing invoices.
pub const INVOICES_VIEW: &str = "/invoices";
/// The page for creating a new invoice.
pub const NEW_INVOICE_VIEW: &str = "/invoices/new";
/// The page for editing an existing invoice.
pub const EDIT_INVOICE_VIEW: &str = "/invoices/{invoice_id}/edit";

/// The route to list and create incomes.
pub const INCOMES_API: &str = "/api/incomes";
/// The route to get, update and delete a single income.
pub const INCOME_API: &str = "/api/incomes/{income_id}";
/// The route to list and create expenses.
pub const EXPENSES_API: &str = "/api/expenses";
/// The route to get, update and delete a single expense.
pub const EXPENSE_API: &str = "/api/expenses/{expense_id}";
/// The route to list the invoices attached to an expense.
pub const EXPENSE_INVOICES_API: &str = "/api/expenses/{expense_id}/invoices";
/// The route to list and create service accounts.
pub const ACCOUNTS_API: &str = "/api/accounts";
/// The route to get, update and delete a single service account.
pub const ACCOUNT_API: &str = "/api/accounts/{account_id}";
/// The route to list and create invoices.
pub const INVOICES_API: &str = "/api/invoices";
/// The route to get, update and delete a single invoice.
pub const INVOICE_API: &str = "/api/invoices/{invoice_id}";
/// The route to download the document stored for an invoice.
pub const INVOICE_DOCUMENT_API: &str = "/api/invoices/{invoice_id}/document";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: DatabaseId) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
