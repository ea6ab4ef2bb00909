use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::views::pages;

/// Reasons a link token can be rejected.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The token was empty after normalization.
    #[error("token is empty")]
    Empty,

    /// The token is not valid base64.
    #[error("malformed base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The ciphertext cannot be split into whole cipher blocks.
    #[error("ciphertext length {0} is not a multiple of the block size")]
    BlockLength(usize),

    /// The decrypted padding bytes are out of range or inconsistent.
    #[error("invalid padding")]
    Padding,

    /// The transmitted IV or nonce has an unsupported length.
    #[error("unsupported IV length {0}")]
    Iv(usize),

    /// The authenticated ciphertext failed its integrity check.
    #[error("authentication failed")]
    Authentication,

    /// The plaintext is not UTF-8.
    #[error("plaintext is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    /// The plaintext is not a class payload.
    #[error("plaintext is not a valid class payload")]
    Json,
}

impl DecodeError {
    /// The reason shown to the client.
    ///
    /// Every failure found after decryption reads the same, so responses say
    /// nothing about the plaintext or its padding.
    pub fn public_reason(&self) -> String {
        match self {
            DecodeError::Padding
            | DecodeError::Authentication
            | DecodeError::Utf8(_)
            | DecodeError::Json => "not a valid class payload".to_string(),
            other => other.to_string(),
        }
    }
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// One or more required session fields are absent or empty.
    #[error("Missing required parameters: {0}")]
    MissingParameter(String),

    /// The query string could not be parsed.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The link token could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// An encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::MissingParameter(ref fields) => {
                tracing::debug!("Missing parameters: {}", fields);
                (
                    StatusCode::BAD_REQUEST,
                    "Missing required query parameters".to_string(),
                )
            }

            AppError::InvalidQuery(ref msg) => {
                tracing::debug!("Invalid query: {}", msg);
                (StatusCode::BAD_REQUEST, "Invalid query string".to_string())
            }

            AppError::Decode(ref e) => {
                tracing::warn!("❌ Link rejected: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    format!("Invalid or corrupted class link: {}", e.public_reason()),
                )
            }

            AppError::Encryption(ref msg) => {
                tracing::error!("Encryption error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong on our side. Please try again later.".to_string(),
                )
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Page not found".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong on our side. Please try again later.".to_string(),
                )
            }
        };

        (status, Html(pages::render_error(&message))).into_response()
    }
}
