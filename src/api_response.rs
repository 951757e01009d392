//! Responses shared by the JSON API handlers.
//!
//! The API serves two kinds of clients: plain JSON clients, and the htmx
//! forms in the HTML pages. Requests from htmx carry the `HX-Request` header
//! and get a redirect or an HTML alert instead of JSON.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use serde::Serialize;

use crate::{Error, alert::Alert};

/// The response for a newly created record.
pub fn created<T: Serialize>(is_htmx: bool, record: T, redirect_to: &str) -> Response {
    if is_htmx {
        redirect(redirect_to)
    } else {
        (StatusCode::CREATED, Json(record)).into_response()
    }
}

/// The response for an updated record.
pub fn updated<T: Serialize>(is_htmx: bool, record: T, redirect_to: &str) -> Response {
    if is_htmx {
        redirect(redirect_to)
    } else {
        Json(record).into_response()
    }
}

/// The response for a deleted record.
pub fn deleted(is_htmx: bool, message: &str) -> Response {
    if is_htmx {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Alert::SuccessSimple {
            message: message.to_owned(),
        }
        .into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

/// The response for a failed request.
pub fn failed(is_htmx: bool, error: Error) -> Response {
    if is_htmx {
        error.into_alert_response()
    } else {
        error.into_response()
    }
}

fn redirect(redirect_to: &str) -> Response {
    (HxRedirect(redirect_to.to_owned()), StatusCode::SEE_OTHER).into_response()
}
