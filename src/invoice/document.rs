//! Checks for the documents uploaded with invoices.

use crate::{Error, invoice::core::DocumentType};

/// The name of the multipart field that carries the document.
pub const DOCUMENT_FIELD: &str = "archivo";

/// The largest document that can be uploaded, in bytes (2 MiB).
pub const MAX_DOCUMENT_SIZE: usize = 2 * 1024 * 1024;

/// The file formats accepted for invoice documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Jpeg,
    Png,
    Pdf,
}

impl DocumentFormat {
    /// The format for a declared media type, ignoring any parameters such as
    /// `; charset=...`.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(DocumentFormat::Jpeg),
            "image/png" => Some(DocumentFormat::Png),
            "application/pdf" => Some(DocumentFormat::Pdf),
            _ => None,
        }
    }

    /// The format for a stored file's extension.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(DocumentFormat::Jpeg),
            "png" => Some(DocumentFormat::Png),
            "pdf" => Some(DocumentFormat::Pdf),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Jpeg => "jpg",
            DocumentFormat::Png => "png",
            DocumentFormat::Pdf => "pdf",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            DocumentFormat::Jpeg => "image/jpeg",
            DocumentFormat::Png => "image/png",
            DocumentFormat::Pdf => "application/pdf",
        }
    }

    /// The bytes every file of this format starts with.
    fn signature(self) -> &'static [u8] {
        match self {
            DocumentFormat::Jpeg => &[0xFF, 0xD8, 0xFF],
            DocumentFormat::Png => &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
            DocumentFormat::Pdf => b"%PDF-",
        }
    }
}

/// A file as it was received from the client.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedDocument {
    /// The media type declared by the client.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// An uploaded file that passed the format and size checks.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub format: DocumentFormat,
    /// The type recorded for the invoice, inferred from the declared media type.
    pub document_type: DocumentType,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    /// Check that the document is a JPEG, PNG or PDF file no larger than
    /// [MAX_DOCUMENT_SIZE], and that its content matches its declared type.
    ///
    /// # Errors
    /// Returns an [Error::UnsupportedMediaType] if any of the checks fail.
    pub fn validate(self) -> Result<Document, Error> {
        if self.bytes.len() > MAX_DOCUMENT_SIZE {
            return Err(too_large_error());
        }

        let format = DocumentFormat::from_media_type(&self.media_type).ok_or_else(|| {
            Error::UnsupportedMediaType(format!(
                "The {DOCUMENT_FIELD} field must be a file of type: jpeg, png, jpg, pdf \
                (got {}).",
                self.media_type
            ))
        })?;

        if !self.bytes.starts_with(format.signature()) {
            return Err(Error::UnsupportedMediaType(format!(
                "The {DOCUMENT_FIELD} content does not match its declared type {}.",
                self.media_type
            )));
        }

        Ok(Document {
            format,
            document_type: DocumentType::from_media_type(&self.media_type),
            bytes: self.bytes,
        })
    }
}

pub fn too_large_error() -> Error {
    Error::UnsupportedMediaType(format!(
        "The {DOCUMENT_FIELD} field must not be greater than {} kilobytes.",
        MAX_DOCUMENT_SIZE / 1024
    ))
}


#[cfg(test)]
mod tests {
    use crate::{
        Error,
        invoice::{
            core::DocumentType,
            document::{
                DocumentFormat, MAX_DOCUMENT_SIZE, UploadedDocument,
                test_data::{jpeg, pdf, png},
            },
        },
    };

    fn upload(media_type: &str, bytes: Vec<u8>) -> UploadedDocument {
        UploadedDocument {
            media_type: media_type.to_owned(),
            bytes,
        }
    }

    #[test]
    fn accepts_supported_formats() {
        let got = upload("image/png", png()).validate().unwrap();
        assert_eq!(got.format, DocumentFormat::Png);
        assert_eq!(got.document_type, DocumentType::Image);

        let got = upload("image/jpg", jpeg(10 * 1024)).validate().unwrap();
        assert_eq!(got.format, DocumentFormat::Jpeg);

        let got = upload("application/pdf", pdf()).validate().unwrap();
        assert_eq!(got.document_type, DocumentType::Pdf);
    }

    #[test]
    fn rejects_unsupported_media_type() {
        let got = upload("text/plain", b"hello".to_vec()).validate();

        assert!(matches!(got, Err(Error::UnsupportedMediaType(_))));
    }

    #[test]
    fn rejects_content_that_does_not_match_declared_type() {
        let got = upload("image/png", pdf()).validate();

        assert!(matches!(got, Err(Error::UnsupportedMediaType(_))));
    }

    #[test]
    fn rejects_large_documents() {
        assert!(upload("image/jpeg", jpeg(MAX_DOCUMENT_SIZE)).validate().is_ok());

        let got = upload("image/jpeg", jpeg(MAX_DOCUMENT_SIZE + 1)).validate();
        assert!(matches!(got, Err(Error::UnsupportedMediaType(_))));

        let got = upload("image/jpeg", jpeg(3 * 1024 * 1024)).validate();
        assert!(matches!(got, Err(Error::UnsupportedMediaType(_))));
    }

    #[test]
    fn maps_extensions_back_to_formats() {
        for format in [DocumentFormat::Jpeg, DocumentFormat::Png, DocumentFormat::Pdf] {
            assert_eq!(DocumentFormat::from_extension(format.extension()), Some(format));
        }
        assert_eq!(DocumentFormat::from_extension("exe"), None);
    }
}
