//! Error types for the server crate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors returned by the note API.
///
/// The display text is the plain-text response body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Payload missing, malformed, or missing a required field.
    #[error("Bad request")]
    BadRequest,

    /// A requested path escapes the data root or is not a note file.
    #[error("{0}")]
    InvalidPath(&'static str),

    /// The requested folder does not exist.
    #[error("Folder not found")]
    FolderNotFound,

    /// The requested note does not exist.
    #[error("File not found")]
    FileNotFound,

    /// The route does not support the request method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// A filesystem operation failed.
    #[error("{body}")]
    Storage {
        body: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    pub(crate) fn storage(body: &'static str, source: std::io::Error) -> Self {
        Self::Storage { body, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest | ApiError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            ApiError::FolderNotFound | ApiError::FileNotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Storage { body, source } => {
                tracing::error!(error = %source, "{body}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind the listener.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The serve loop failed.
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
