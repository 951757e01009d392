//! Reads invoice requests, which may be multipart forms (with a document) or
//! JSON objects (without one).

use axum::{
    Json,
    extract::{FromRequest, Multipart, Request, multipart::Field},
    http::header::CONTENT_TYPE,
};
use serde_json::Value;

use crate::{
    Error,
    invoice::document::{DOCUMENT_FIELD, MAX_DOCUMENT_SIZE, UploadedDocument, too_large_error},
    validation::{Fields, fields_from_json},
};

/// The fields and optional document sent to create or update an invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceSubmission {
    pub fields: Fields,
    pub document: Option<UploadedDocument>,
}

impl<S> FromRequest<S> for InvoiceSubmission
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|content_type| content_type.to_str().ok())
            .is_some_and(|content_type| {
                content_type
                    .to_ascii_lowercase()
                    .starts_with("multipart/form-data")
            });

        if is_multipart {
            let multipart = Multipart::from_request(request, state)
                .await
                .map_err(|rejection| Error::InvalidPayload(rejection.body_text()))?;

            read_multipart(multipart).await
        } else {
            let fields = fields_from_json(Json::<Value>::from_request(request, state).await)?;

            Ok(Self {
                fields,
                document: None,
            })
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<InvoiceSubmission, Error> {
    let mut fields = Fields::new();
    let mut document = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::InvalidPayload(error.body_text()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == DOCUMENT_FIELD {
            document = read_document(field).await?;
        } else {
            let text = field
                .text()
                .await
                .map_err(|error| Error::InvalidPayload(error.body_text()))?;
            fields.insert_text(&name, text);
        }
    }

    Ok(InvoiceSubmission { fields, document })
}

/// Read the document in chunks, stopping as soon as it is too large.
///
/// Browsers send an empty part without a file name when no file was chosen,
/// which is treated as no document.
async fn read_document(mut field: Field<'_>) -> Result<Option<UploadedDocument>, Error> {
    let has_file_name = field.file_name().is_some_and(|name| !name.is_empty());
    let media_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_owned();
    let mut bytes = Vec::new();

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|error| Error::InvalidPayload(error.body_text()))?
    {
        if bytes.len() + chunk.len() > MAX_DOCUMENT_SIZE {
            return Err(too_large_error());
        }

        bytes.extend_from_slice(&chunk);
    }

    if !has_file_name && bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(UploadedDocument { media_type, bytes }))
}
