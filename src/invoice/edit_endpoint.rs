//! Defines the endpoint for updating an invoice and replacing its document.

use axum::{
    extract::{Path, State},
    response::Response,
};
use axum_htmx::HxRequest;

use crate::{
    Error, FieldErrors,
    api_response::{failed, updated},
    database_id::DatabaseId,
    endpoints,
    invoice::{
        core::{Invoice, InvoiceData, check_expense_reference, get_invoice, update_invoice_row},
        document::UploadedDocument,
        state::InvoiceState,
        submission::InvoiceSubmission,
    },
};

/// A route handler for updating an invoice from a multipart form or a JSON
/// object.
pub async fn edit_invoice_endpoint(
    State(state): State<InvoiceState>,
    HxRequest(is_htmx): HxRequest,
    Path(invoice_id): Path<DatabaseId>,
    submission: Result<InvoiceSubmission, Error>,
) -> Response {
    match submission.and_then(|submission| update_invoice(invoice_id, submission, &state)) {
        Ok(invoice) => updated(is_htmx, invoice, endpoints::INVOICES_VIEW),
        Err(error) => failed(is_htmx, error),
    }
}

/// Update the invoice `id` with the fields in `submission`.
///
/// Fields that are absent keep their stored values. Without a document the
/// stored document, its path and its type are left alone. With a document,
/// the new document is stored first, the row is pointed at it, and only then
/// is the old document deleted. If the row cannot be updated the new
/// document is deleted and the invoice still points at the old one.
///
/// The database lock is not held while documents are written or deleted.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid invoice,
/// - [Error::UnsupportedMediaType] if the document is not an accepted file,
/// - [Error::Validation] if a field is invalid,
/// - [Error::Storage] if a document could not be stored or deleted,
/// - or [Error::SqlError] if there is an unexpected SQL error.
pub fn update_invoice(
    id: DatabaseId,
    submission: InvoiceSubmission,
    state: &InvoiceState,
) -> Result<Invoice, Error> {
    let (data, document) = {
        let connection = state.connection()?;
        let current = get_invoice(id, &connection)?;

        let document = submission
            .document
            .map(UploadedDocument::validate)
            .transpose()?;

        let mut errors = FieldErrors::new();
        let data = InvoiceData::from_fields(&submission.fields, Some(current.data), &mut errors);
        if let Some(data) = &data {
            check_expense_reference(data.expense_id, &connection, &mut errors)?;
        }
        let data = match data {
            Some(data) if errors.is_empty() => data,
            _ => return Err(Error::Validation(errors)),
        };

        let Some(document) = document else {
            let invoice = Invoice {
                id,
                data,
                document_type: current.document_type,
                document_path: current.document_path,
            };
            update_invoice_row(&invoice, &connection)?;

            return Ok(invoice);
        };

        (data, document)
    };

    let document_path = state
        .blob_store
        .put(&document.bytes, document.format.extension())?;
    let invoice = Invoice {
        id,
        data,
        document_type: document.document_type,
        document_path,
    };

    // The replaced path is read in the same transaction as the update.
    let replaced_path = state
        .connection()
        .and_then(|connection| {
            let transaction = connection.unchecked_transaction()?;
            let replaced_path = get_invoice(id, &transaction)?.document_path;
            update_invoice_row(&invoice, &transaction)?;
            transaction.commit()?;
            Ok(replaced_path)
        })
        .inspect_err(|_| state.discard_document(&invoice.document_path))?;

    tracing::info!(
        "replaced document for invoice {id}: {replaced_path} -> {}",
        invoice.document_path
    );

    state
        .blob_store
        .delete(&replaced_path)
        .inspect_err(|error| {
            tracing::error!("could not delete replaced document {replaced_path}: {error}")
        })?;

    Ok(invoice)
}
