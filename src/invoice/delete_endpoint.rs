//! Defines the endpoint for deleting an invoice and its document.

use axum::{
    extract::{Path, State},
    response::Response,
};
use axum_htmx::HxRequest;

use crate::{
    Error,
    api_response::{deleted, failed},
    database_id::DatabaseId,
    invoice::{core::delete_invoice_row, state::InvoiceState},
};

/// A route handler for deleting an invoice.
///
/// htmx requests get a success alert so that the table row can be removed.
pub async fn delete_invoice_endpoint(
    State(state): State<InvoiceState>,
    HxRequest(is_htmx): HxRequest,
    Path(invoice_id): Path<DatabaseId>,
) -> Response {
    match delete_invoice(invoice_id, &state) {
        Ok(()) => deleted(is_htmx, "Invoice deleted successfully"),
        Err(error) => failed(is_htmx, error),
    }
}

/// Delete the invoice `id` and its document.
///
/// The row is only deleted once the document has been deleted, so a failed
/// document delete leaves the invoice as it was.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid invoice,
/// - [Error::Storage] if the document could not be deleted,
/// - or [Error::SqlError] if there is an unexpected SQL error.
pub fn delete_invoice(id: DatabaseId, state: &InvoiceState) -> Result<(), Error> {
    let connection = state.connection()?;
    let transaction = connection.unchecked_transaction()?;

    let document_path = delete_invoice_row(id, &transaction)?;
    state.blob_store.delete(&document_path)?;

    transaction.commit()?;
    tracing::info!("deleted invoice {id} and document {document_path}");

    Ok(())
}
