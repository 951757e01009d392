//! Defines the endpoint for creating an invoice with its document.

use axum::{extract::State, response::Response};
use axum_htmx::HxRequest;

use crate::{
    Error, FieldErrors,
    api_response::{created, failed},
    endpoints,
    invoice::{
        core::{Invoice, InvoiceData, check_expense_reference, insert_invoice},
        document::{DOCUMENT_FIELD, UploadedDocument},
        state::InvoiceState,
        submission::InvoiceSubmission,
    },
};

/// A route handler for creating an invoice from a multipart form.
///
/// Redirects htmx requests to the invoices page on success.
pub async fn create_invoice_endpoint(
    State(state): State<InvoiceState>,
    HxRequest(is_htmx): HxRequest,
    submission: Result<InvoiceSubmission, Error>,
) -> Response {
    match submission.and_then(|submission| create_invoice(submission, &state)) {
        Ok(invoice) => {
            tracing::info!("created invoice {} at {}", invoice.id, invoice.document_path);
            created(is_htmx, invoice, endpoints::INVOICES_VIEW)
        }
        Err(error) => failed(is_htmx, error),
    }
}

/// Validate `submission`, store its document and save the invoice.
///
/// Nothing is stored if any step fails. The database lock is not held while
/// the document is written.
///
/// # Errors
/// This function will return a:
/// - [Error::UnsupportedMediaType] if the document is not an accepted file,
/// - [Error::Validation] if a field or the document is missing or invalid,
/// - [Error::Storage] if the document could not be stored,
/// - or [Error::SqlError] if there is an unexpected SQL error.
pub fn create_invoice(submission: InvoiceSubmission, state: &InvoiceState) -> Result<Invoice, Error> {
    let document = submission
        .document
        .map(UploadedDocument::validate)
        .transpose()?;

    let mut errors = FieldErrors::new();
    let data = InvoiceData::from_fields(&submission.fields, None, &mut errors);
    if document.is_none() {
        errors.add(DOCUMENT_FIELD, format!("The {DOCUMENT_FIELD} field is required."));
    }
    if let Some(data) = &data {
        check_expense_reference(data.expense_id, &*state.connection()?, &mut errors)?;
    }

    let (data, document) = match (data, document) {
        (Some(data), Some(document)) if errors.is_empty() => (data, document),
        _ => return Err(Error::Validation(errors)),
    };

    let document_path = state
        .blob_store
        .put(&document.bytes, document.format.extension())?;

    // An expense deleted since the check fails the insert's foreign key.
    state
        .connection()
        .and_then(|connection| {
            insert_invoice(data, document.document_type, document_path.clone(), &connection)
        })
        .inspect_err(|_| state.discard_document(&document_path))
}
