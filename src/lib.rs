//! A web app for keeping track of personal finances: incomes, expenses, the
//! invoices attached to expenses, and the credentials for online service
//! accounts.
//!
//! This library provides a JSON REST API and a set of HTML pages that drive
//! the API with htmx.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod account;
mod alert;
mod api_response;
mod app_state;
mod blob_store;
mod database_id;
mod db;
mod endpoints;
mod entry;
mod expense;
mod html;
mod income;
mod invoice;
mod logging;
mod navigation;
mod not_found;
mod routing;
mod search;
mod validation;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use blob_store::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use validation::FieldErrors;

use crate::{
    alert::Alert,
    html::error_view,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more fields in the request were missing, malformed or out of
    /// range.
    ///
    /// The client should correct the fields listed in [FieldErrors] and try
    /// again.
    #[error("the given data was invalid: {0}")]
    Validation(FieldErrors),

    /// The request body could not be parsed as JSON or as a multipart form.
    #[error("could not parse the request body: {0}")]
    InvalidPayload(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows or when
    /// a stored document is missing.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An uploaded document is not a JPEG, PNG or PDF file, or it is too
    /// large.
    #[error("unsupported document: {0}")]
    UnsupportedMediaType(String),

    /// A document could not be written to or deleted from the blob store.
    ///
    /// The string should only be logged for debugging on the server.
    #[error("document storage failed: {0}")]
    Storage(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            // Code 787 occurs when a FOREIGN KEY constraint failed. The only
            // foreign key in the schema is the expense an invoice belongs to.
            rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == 787 => {
                Error::Validation(FieldErrors::single(
                    "gasto_id",
                    "The selected gasto id is invalid.",
                ))
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::Storage(_) | Error::SqlError(_) | Error::DatabaseLockError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Render the error as an HTML alert for requests made by htmx.
    fn into_alert_response(self) -> Response {
        let status_code = self.status_code();

        let alert = match self {
            Error::Validation(errors) => Alert::Error {
                message: "Please check the form".to_owned(),
                details: errors.to_string(),
            },
            Error::InvalidPayload(details) => Alert::Error {
                message: "The form could not be read".to_owned(),
                details,
            },
            Error::NotFound => Alert::Error {
                message: "Not found".to_owned(),
                details: "The record could not be found. \
                    Try refreshing the page to see if it has already been deleted."
                    .to_owned(),
            },
            Error::UnsupportedMediaType(details) => Alert::Error {
                message: "Unsupported document".to_owned(),
                details,
            },
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details: "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                }
            }
        };

        (status_code, alert.into_html()).into_response()
    }

    /// Render the error as a full HTML page for page routes.
    fn into_page_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_view(
                        "Internal Server Error",
                        "500",
                        "Sorry, something went wrong.",
                        "Try again later or check the server logs",
                    ),
                )
                    .into_response()
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let body = match self {
            Error::Validation(errors) => json!({
                "message": "The given data was invalid.",
                "errors": errors,
            }),
            Error::InvalidPayload(details) | Error::UnsupportedMediaType(details) => {
                json!({ "message": details })
            }
            Error::NotFound => json!({ "message": "The requested resource could not be found." }),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                json!({
                    "message": "An unexpected error occurred, check the server logs for more details."
                })
            }
        };

        (status_code, Json(body)).into_response()
    }
}
