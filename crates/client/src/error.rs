//! Error taxonomy for backend calls.
//!
//! Every failure ends in one of two places: a user-facing alert (built from
//! [`ApiError::user_message`]) or a log line. Nothing here is retried.

use cake_shop_core::card::CardFormErrors;
use thiserror::Error;

use crate::session::SessionStoreError;

/// Alert text when the server gave no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors returned by [`crate::ApiClient`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never got a response (connection, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        message: Option<String>,
    },

    /// The access token was rejected (HTTP 401).
    #[error("Unauthorized: {}", .message.as_deref().unwrap_or("session expired"))]
    Unauthorized { message: Option<String> },

    /// The session's role may not perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The response body did not match the expected shape.
    #[error("Failed to parse backend response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response parsed but lacked a field the call depends on.
    #[error("Unexpected backend response: {0}")]
    UnexpectedResponse(String),

    /// Card form failed client-side validation; nothing was sent.
    #[error("Invalid card details: {0}")]
    InvalidCard(CardFormErrors),

    /// Other client-side validation failure; nothing was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Reading or writing the persisted session failed.
    #[error("Session store error: {0}")]
    SessionStore(#[from] SessionStoreError),
}

impl ApiError {
    /// Text for an alert dialog: the server's message when it sent one,
    /// validation messages for local failures, a fixed fallback otherwise.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status {
                message: Some(message),
                ..
            }
            | Self::Unauthorized {
                message: Some(message),
            } if !message.trim().is_empty() => message.clone(),
            Self::Unauthorized { .. } => "Your session has expired. Please log in again.".to_string(),
            Self::Forbidden(message) | Self::InvalidInput(message) => message.clone(),
            Self::InvalidCard(errors) => errors.summary(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Whether the caller should drop the session and send the user to login.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// HTTP status code when the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;
