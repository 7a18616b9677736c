//! Error types for the parsing service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for parsing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Parsing service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Extension is not in the parser registry
    #[error("Unsupported file type: {extension}. Supported types are: {}", supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    /// Staging the upload on disk failed
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// A decoder failed on a staged file
    #[error("{0}")]
    Processing(String),

    /// Request body exceeded the configured upload limit
    #[error("File too large: uploads are limited to {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Multipart body is missing the file or could not be read
    #[error("{0}")]
    InvalidUpload(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an unsupported format error listing what is supported
    pub fn unsupported(extension: impl Into<String>, supported: &[&str]) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
            supported: supported.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create a file parse error
    pub fn file_parse(kind: &str, message: impl std::fmt::Display) -> Self {
        Self::Processing(format!("Failed to parse {}: {}", kind, message))
    }

    /// Create a processing error
    pub fn processing(message: impl Into<String>) -> Self {
        Self::Processing(message.into())
    }

    /// Create an invalid upload error
    pub fn invalid_upload(message: impl Into<String>) -> Self {
        Self::InvalidUpload(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::UnsupportedFormat { .. } => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::InvalidUpload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Io(_) | Error::Processing(_) | Error::Config(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing `detail` message
    pub fn detail(&self) -> String {
        match self {
            Error::UnsupportedFormat { .. }
            | Error::PayloadTooLarge { .. }
            | Error::InvalidUpload(_) => self.to_string(),
            _ => format!("Error processing file: {}", self),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "detail": self.detail() }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_detail_lists_extensions() {
        let err = Error::unsupported(".xyz", &[".pdf", ".txt"]);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.detail(),
            "Unsupported file type: .xyz. Supported types are: .pdf, .txt"
        );
    }

    #[test]
    fn test_processing_detail_is_prefixed() {
        let err = Error::file_parse("DOCX", "invalid zip header");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.detail(),
            "Error processing file: Failed to parse DOCX: invalid zip header"
        );
    }

    #[test]
    fn test_io_maps_to_500() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "Error processing file: disk full");
    }

    #[test]
    fn test_payload_too_large_names_limit() {
        let err = Error::PayloadTooLarge { limit: 64 };
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.detail(), "File too large: uploads are limited to 64 bytes");
    }

    #[test]
    fn test_invalid_upload_is_client_error() {
        let err = Error::invalid_upload("No file provided in field 'file'");
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.detail(), "No file provided in field 'file'");
    }
}
