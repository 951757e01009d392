//! Middleware for logging requests and responses.

use axum::{
    Json,
    body::{Body, Bytes, to_bytes},
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

/// The number of characters of a body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest request body that is accepted, in bytes.
///
/// This is well above the largest document so that oversized documents are
/// rejected by the document checks with a useful message.
pub const MAX_REQUEST_BODY_SIZE: usize = 8 * 1024 * 1024;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level with their
/// bodies truncated to [LOG_BODY_LENGTH_LIMIT] characters, and the full
/// bodies are logged at the `debug` level. Passwords are redacted, and
/// multipart and binary bodies are logged by size only.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, MAX_REQUEST_BODY_SIZE).await {
        Ok(body) => body,
        Err(error) => {
            tracing::warn!(
                "could not read request body for {} {}: {error}",
                parts.method,
                parts.uri
            );
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({
                    "message": format!(
                        "The request body must not be greater than {} kilobytes.",
                        MAX_REQUEST_BODY_SIZE / 1024
                    )
                })),
            )
                .into_response();
        }
    };

    log_body(
        &format!("Received request: {} {}", parts.method, parts.uri),
        &display_body(&parts.headers, &body),
    );

    let request = Request::from_parts(parts, Body::from(body));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body = match to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log_body(
        &format!("Sending response: {}", parts.status),
        &display_body(&parts.headers, &body),
    );

    Response::from_parts(parts, Body::from(body))
}

/// The text to log for a body with the given headers.
fn display_body(headers: &HeaderMap, body: &Bytes) -> String {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if body.is_empty() {
        String::new()
    } else if content_type.starts_with("multipart/") {
        format!("<multipart body, {} bytes>", body.len())
    } else if content_type.starts_with("application/json") {
        redact_json(body)
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        redact_form(&String::from_utf8_lossy(body))
    } else if content_type.starts_with("text/") {
        String::from_utf8_lossy(body).into_owned()
    } else {
        format!("<{content_type} body, {} bytes>", body.len())
    }
}

fn redact_json(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(mut value) => {
            redact_json_value(&mut value);
            value.to_string()
        }
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

fn redact_json_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if key == "password" {
                    *value = Value::String(REDACTED.to_owned());
                } else {
                    redact_json_value(value);
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(redact_json_value),
        _ => {}
    }
}

fn redact_form(form_text: &str) -> String {
    form_text
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some(("password", _)) => format!("password={REDACTED}"),
            _ => pair.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn log_body(message: &str, body: &str) {
    if body.chars().count() > LOG_BODY_LENGTH_LIMIT {
        let truncated: String = body.chars().take(LOG_BODY_LENGTH_LIMIT).collect();
        tracing::info!("{message}\nbody: {truncated}...");
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{message}\nbody: {body:?}");
    }
}
