//! CLI command implementations.

pub mod auth;
pub mod cakes;
pub mod calendar;
pub mod card;
pub mod dashboard;
pub mod orders;

use cake_shop_client::{
    ApiClient, ApiError, ClientConfig, ConfigError, FileSessionStore, Session, SessionStore,
    SessionStoreError,
};
use cake_shop_core::EmailError;
use cake_shop_core::card::CardFormErrors;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The saved session could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] SessionStoreError),

    /// The email argument is not a valid address.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// No saved session; the user must log in first.
    #[error("Not logged in")]
    NotLoggedIn,

    /// Card form validation failed.
    #[error("Invalid card details: {0}")]
    InvalidCard(CardFormErrors),

    /// Reading input or an orders file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An orders file or output could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CommandError {
    /// Message for the terminal.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            Self::NotLoggedIn => "You are not logged in. Run `cake-cli login` first.".to_string(),
            Self::InvalidCard(errors) => errors.summary(),
            other => other.to_string(),
        }
    }
}

/// Client and session store built from configuration.
pub fn connect(config: &ClientConfig) -> Result<(ApiClient, FileSessionStore), CommandError> {
    let client = ApiClient::new(config)?;
    let store = FileSessionStore::new(config.session_file.clone());
    Ok((client, store))
}

/// The saved session, or `NotLoggedIn`.
pub fn require_session(store: &impl SessionStore) -> Result<Session, CommandError> {
    store.load()?.ok_or(CommandError::NotLoggedIn)
}

/// Run an authenticated call, forgetting the saved session if the backend
/// says it has expired.
pub fn forget_expired<T>(
    store: &impl SessionStore,
    result: Result<T, ApiError>,
) -> Result<T, CommandError> {
    match result {
        Err(e) if e.requires_login() => {
            store.clear()?;
            Err(e.into())
        }
        other => Ok(other?),
    }
}
