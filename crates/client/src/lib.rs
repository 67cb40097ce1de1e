//! Cake Shop Client - REST client for the Cake Shop backend.
//!
//! This crate provides:
//! - [`ApiClient`] - Typed async access to every backend endpoint
//! - [`Session`] - Tokens and identity passed to authenticated calls
//! - [`SessionStore`] - Persistence for the session between runs
//! - [`ClientConfig`] - Configuration from environment variables
//!
//! # Example
//!
//! ```rust,ignore
//! use cake_shop_client::{ApiClient, ClientConfig, LoginOutcome};
//!
//! let client = ApiClient::new(&ClientConfig::from_env()?)?;
//! match client.login(&email, &password).await? {
//!     LoginOutcome::Authenticated(session) => { /* ... */ }
//!     LoginOutcome::TwoFactorRequired { user_id, .. } => {
//!         client.request_two_factor_code(&user_id).await?;
//!         let session = client.verify_two_factor(&user_id, &code).await?;
//!     }
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod session;

pub use api::auth::{LoginOutcome, Registration};
pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, GENERIC_ERROR_MESSAGE, Result};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore, SessionStoreError};
