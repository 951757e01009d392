//! Invoices and the documents uploaded with them.
//!
//! Each invoice owns exactly one document in the [crate::BlobStore]. The
//! endpoints here keep the invoice rows and the stored documents in step.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod document;
mod edit_endpoint;
mod get_endpoint;
mod pages;
mod state;
mod submission;

pub use self::core::{Invoice, create_invoice_table, delete_invoices_for_expense};
pub use create_endpoint::create_invoice_endpoint;
pub use delete_endpoint::delete_invoice_endpoint;
pub use edit_endpoint::edit_invoice_endpoint;
pub use get_endpoint::{
    get_invoice_document_endpoint, get_invoice_endpoint, invoices_for_expense,
    list_invoices_endpoint,
};
pub use pages::{get_edit_invoice_page, get_invoices_page, get_new_invoice_page, invoices_table};
pub use state::InvoiceState;

#[cfg(test)]
pub use self::core::{DocumentType, insert_invoice, test_data};
#[cfg(test)]
pub use document::test_data as document_test_data;
