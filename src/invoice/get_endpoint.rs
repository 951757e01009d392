//! Defines the endpoints for reading invoices and their documents.

use std::path::Path as FilePath;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    database_id::DatabaseId,
    invoice::{
        core::{Invoice, get_invoice, list_invoices, list_invoices_for_expense},
        document::DocumentFormat,
        state::InvoiceState,
    },
    search::SearchQuery,
};

/// Retrieve the invoices whose name matches `query`, most recently issued
/// first.
///
/// # Errors
/// Returns an error if the database lock cannot be acquired or there is an
/// SQL error.
pub fn search_invoices(state: &InvoiceState, query: &SearchQuery) -> Result<Vec<Invoice>, Error> {
    let invoices = list_invoices(&*state.connection()?)?;

    Ok(query.filter(invoices, |invoice| vec![invoice.data.name.as_str()]))
}

/// Retrieve the invoices attached to the expense `expense_id`.
///
/// # Errors
/// Returns an error if the database lock cannot be acquired or there is an
/// SQL error.
pub fn invoices_for_expense(
    state: &InvoiceState,
    expense_id: DatabaseId,
) -> Result<Vec<Invoice>, Error> {
    list_invoices_for_expense(expense_id, &*state.connection()?)
}

/// Retrieve a single invoice.
///
/// # Errors
/// Returns an [Error::NotFound] if `id` does not refer to a valid invoice.
pub fn find_invoice(state: &InvoiceState, id: DatabaseId) -> Result<Invoice, Error> {
    get_invoice(id, &*state.connection()?)
}

/// A route handler for listing invoices, optionally filtered with `?search=`.
pub async fn list_invoices_endpoint(
    State(state): State<InvoiceState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match search_invoices(&state, &query) {
        Ok(invoices) => Json(invoices).into_response(),
        Err(error) => error.into_response(),
    }
}

pub async fn get_invoice_endpoint(
    State(state): State<InvoiceState>,
    Path(invoice_id): Path<DatabaseId>,
) -> Response {
    match find_invoice(&state, invoice_id) {
        Ok(invoice) => Json(invoice).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler that sends the document stored for an invoice so that it
/// can be viewed in the browser.
pub async fn get_invoice_document_endpoint(
    State(state): State<InvoiceState>,
    Path(invoice_id): Path<DatabaseId>,
) -> Response {
    let result = find_invoice(&state, invoice_id).and_then(|invoice| {
        let bytes = state.blob_store.get(&invoice.document_path)?;
        Ok((invoice, bytes))
    });

    let (invoice, bytes) = match result {
        Ok(document) => document,
        Err(Error::NotFound) => return Error::NotFound.into_response(),
        Err(error) => {
            tracing::error!("could not read document for invoice {invoice_id}: {error}");
            return error.into_response();
        }
    };

    let extension = FilePath::new(&invoice.document_path)
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or_default();
    let media_type = DocumentFormat::from_extension(extension)
        .map(DocumentFormat::media_type)
        .unwrap_or("application/octet-stream");

    (
        [
            (CONTENT_TYPE, media_type.to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("inline; filename=\"invoice-{invoice_id}.{extension}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
