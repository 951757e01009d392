//! Route handlers for expenses and the invoices attached to them.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use axum_htmx::HxRequest;
use maud::{Markup, html};
use serde_json::Value;

use crate::{
    Error,
    api_response::{deleted, failed},
    database_id::DatabaseId,
    endpoints::{self, format_endpoint},
    entry::{
        Entry, EntryKind, EntryState, create_entry_response, delete_entry,
        edit_entry_page_response, entries_page_response, entry_form_view, find_entry,
        get_entry_response, list_entries_response, update_entry_response,
    },
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base, format_currency},
    invoice::{
        Invoice, InvoiceState, delete_invoices_for_expense, invoices_for_expense, invoices_table,
    },
    navigation::NavBar,
    search::SearchQuery,
};

const KIND: EntryKind = EntryKind::Expense;

/// List the expenses, newest first, optionally filtered with `?search=`.
pub async fn list_expenses_endpoint(
    State(state): State<EntryState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    list_entries_response(KIND, &state, &query)
}

pub async fn get_expense_endpoint(
    State(state): State<EntryState>,
    Path(expense_id): Path<DatabaseId>,
) -> Response {
    get_entry_response(KIND, &state, expense_id)
}

/// Create an expense from a JSON body.
pub async fn create_expense_endpoint(
    State(state): State<EntryState>,
    HxRequest(is_htmx): HxRequest,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    create_entry_response(KIND, &state, is_htmx, payload)
}

/// Update the fields of an expense given in a JSON body.
pub async fn update_expense_endpoint(
    State(state): State<EntryState>,
    HxRequest(is_htmx): HxRequest,
    Path(expense_id): Path<DatabaseId>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    update_entry_response(KIND, &state, is_htmx, expense_id, payload)
}

/// Delete an expense together with its invoices and their documents.
pub async fn delete_expense_endpoint(
    State(state): State<InvoiceState>,
    HxRequest(is_htmx): HxRequest,
    Path(expense_id): Path<DatabaseId>,
) -> Response {
    match delete_expense(expense_id, &state) {
        Ok(()) => deleted(is_htmx, "Expense deleted successfully"),
        Err(error) => failed(is_htmx, error),
    }
}

/// Delete the expense `id`, every invoice attached to it and their documents.
///
/// The rows are deleted in one transaction before any document is touched,
/// so an invoice never points at a deleted document. A document that cannot
/// be deleted is left behind without an invoice.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid expense,
/// - [Error::Storage] if any of the documents could not be deleted,
/// - or [Error::SqlError] if there is an unexpected SQL error.
pub fn delete_expense(id: DatabaseId, state: &InvoiceState) -> Result<(), Error> {
    let document_paths = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;
        let transaction = connection.unchecked_transaction()?;

        let document_paths = delete_invoices_for_expense(id, &transaction)?;
        delete_entry(KIND, id, &transaction)?;
        transaction.commit()?;

        document_paths
    };

    let failed_paths: Vec<&str> = document_paths
        .iter()
        .filter(|document_path| {
            state
                .blob_store
                .delete(document_path)
                .inspect_err(|error| {
                    tracing::error!("could not delete document {document_path}: {error}")
                })
                .is_err()
        })
        .map(String::as_str)
        .collect();

    if !failed_paths.is_empty() {
        return Err(Error::Storage(format!(
            "expense {id} was deleted but these documents were not: {}",
            failed_paths.join(", ")
        )));
    }

    tracing::info!(
        "deleted expense {id} and {} invoice(s)",
        document_paths.len()
    );

    Ok(())
}

/// List the invoices attached to an expense.
///
/// An expense without invoices, or one that does not exist, gives an empty
/// list.
pub async fn list_expense_invoices_endpoint(
    State(state): State<InvoiceState>,
    Path(expense_id): Path<DatabaseId>,
) -> Response {
    match invoices_for_expense(&state, expense_id) {
        Ok(invoices) => Json(invoices).into_response(),
        Err(error) => error.into_response(),
    }
}

/// Display the expenses in a table.
pub async fn get_expenses_page(
    State(state): State<EntryState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    entries_page_response(KIND, &state, &query)
}

pub async fn get_new_expense_page() -> Response {
    entry_form_view(KIND, None).into_response()
}

pub async fn get_edit_expense_page(
    State(state): State<EntryState>,
    Path(expense_id): Path<DatabaseId>,
) -> Response {
    edit_entry_page_response(KIND, &state, expense_id)
}

/// Display the invoices attached to one expense.
pub async fn get_expense_invoices_page(
    State(entry_state): State<EntryState>,
    State(invoice_state): State<InvoiceState>,
    Path(expense_id): Path<DatabaseId>,
) -> Response {
    let result = find_entry(KIND, &entry_state, expense_id).and_then(|expense| {
        let invoices = invoices_for_expense(&invoice_state, expense_id)?;
        Ok((expense, invoices))
    });

    match result {
        Ok((expense, invoices)) => expense_invoices_view(&expense, &invoices).into_response(),
        Err(error) => error.into_page_response(),
    }
}

fn expense_invoices_view(expense: &Entry, invoices: &[Invoice]) -> Markup {
    let page_url = format_endpoint(endpoints::EXPENSE_INVOICES_VIEW, expense.id);
    let nav_bar = NavBar::new(&page_url).into_html();
    let new_invoice_url = format!("{}?gasto_id={}", endpoints::NEW_INVOICE_VIEW, expense.id);
    let title = format!("Invoices for {}", expense.data.description);
    let empty_message = html!(
        "This expense has no invoices. Add one "
        a href=(new_invoice_url) class=(LINK_STYLE) { "here" }
        "."
    );

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    div
                    {
                        h1 class="text-xl font-bold" { (title) }
                        p class="text-sm text-gray-500 dark:text-gray-400"
                        {
                            (expense.data.date) " · " (format_currency(expense.data.amount))
                        }
                    }

                    a href=(new_invoice_url) class=(LINK_STYLE) { "Add Invoice" }
                }

                (invoices_table(invoices, std::slice::from_ref(expense), empty_message))
            }
        }
    );

    base(&title, &content)
}
