//! Authentication: registration, login, two-factor verification, token
//! refresh, logout and account deletion.
//!
//! Login either completes immediately or asks for a one-time code:
//!
//! ```text
//! login ──► Authenticated(Session)
//!       └─► TwoFactorRequired { user_id } ──► request_two_factor_code
//!                                          ──► verify_two_factor ──► Session
//! ```

use cake_shop_core::{Email, UserId, UserRole};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::session::Session;

/// Result of a login attempt.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Credentials accepted; the session is ready to use.
    Authenticated(Session),
    /// Credentials accepted but a one-time code must be verified first.
    TwoFactorRequired {
        user_id: UserId,
        message: Option<String>,
    },
}

/// Fields of a registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    pub password: SecretString,
    pub phone: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TwoFactorBody<'a> {
    user_id: &'a UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthUser {
    #[serde(rename = "_id", alias = "id")]
    id: UserId,
    #[serde(default)]
    role: UserRole,
}

/// Body of login, verify and refresh responses.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    #[serde(default, alias = "token")]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
    #[serde(default, alias = "twoFactorRequired")]
    requires_two_factor: bool,
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    message: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> Result<Session> {
        let access_token = self
            .access_token
            .ok_or_else(|| ApiError::UnexpectedResponse("missing access token".to_string()))?;
        let refresh_token = self
            .refresh_token
            .ok_or_else(|| ApiError::UnexpectedResponse("missing refresh token".to_string()))?;
        let user = self
            .user
            .ok_or_else(|| ApiError::UnexpectedResponse("missing user".to_string()))?;
        Ok(Session::new(
            SecretString::from(access_token),
            SecretString::from(refresh_token),
            user.id,
            user.role,
        ))
    }
}

impl ApiClient {
    /// Create a customer account. The user logs in afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if the name or password is blank,
    /// otherwise an error if the request fails (e.g. email already taken).
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<()> {
        if registration.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("Name is required".to_string()));
        }
        if registration.password.expose_secret().is_empty() {
            return Err(ApiError::InvalidInput("Password is required".to_string()));
        }

        let body = RegisterBody {
            name: registration.name.trim(),
            email: registration.email.as_str(),
            password: registration.password.expose_secret(),
            phone: registration.phone.as_deref(),
        };
        self.send_unit(Method::POST, "auth/register", Some(&body), None)
            .await?;
        info!("Account registered");
        Ok(())
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for bad credentials, or an error if
    /// the request fails or the response lacks tokens.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<LoginOutcome> {
        let body = LoginBody {
            email: email.as_str(),
            password: password.expose_secret(),
        };
        let response: TokenResponse = self
            .send_json(Method::POST, "auth/login", &body, None)
            .await?;

        if response.requires_two_factor {
            let user_id = response
                .user_id
                .or_else(|| response.user.map(|user| user.id))
                .ok_or_else(|| {
                    ApiError::UnexpectedResponse("two-factor response without user id".to_string())
                })?;
            info!(user_id = %user_id, "Two-factor verification required");
            return Ok(LoginOutcome::TwoFactorRequired {
                user_id,
                message: response.message,
            });
        }

        let session = response.into_session()?;
        info!(user_id = %session.user_id(), role = %session.role(), "Logged in");
        Ok(LoginOutcome::Authenticated(session))
    }

    /// Ask the backend to send (or re-send) a one-time login code.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn request_two_factor_code(&self, user_id: &UserId) -> Result<()> {
        let body = TwoFactorBody {
            user_id,
            code: None,
        };
        self.send_unit(Method::POST, "auth/send-2fa", Some(&body), None)
            .await
    }

    /// Exchange a one-time code for a session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for a blank code, otherwise an error
    /// if the code is rejected or the request fails.
    #[instrument(skip(self, code), fields(user_id = %user_id))]
    pub async fn verify_two_factor(&self, user_id: &UserId, code: &str) -> Result<Session> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ApiError::InvalidInput(
                "Verification code is required".to_string(),
            ));
        }

        let body = TwoFactorBody {
            user_id,
            code: Some(code),
        };
        let response: TokenResponse = self
            .send_json(Method::POST, "auth/verify-2fa", &body, None)
            .await?;
        let session = response.into_session()?;
        info!(user_id = %session.user_id(), "Two-factor verification succeeded");
        Ok(session)
    }

    /// Trade the refresh token for fresh tokens.
    ///
    /// The backend may omit a new refresh token, in which case the old one
    /// is kept.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the refresh token is no longer
    /// valid, or an error if the request fails.
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    pub async fn refresh_session(&self, session: &Session) -> Result<Session> {
        let body = RefreshBody {
            refresh_token: session.refresh_token().expose_secret(),
        };
        let response: TokenResponse = self
            .send_json(Method::POST, "auth/refresh", &body, None)
            .await?;

        let access_token = response
            .access_token
            .ok_or_else(|| ApiError::UnexpectedResponse("missing access token".to_string()))?;
        let refresh_token = response
            .refresh_token
            .map_or_else(|| session.refresh_token().clone(), SecretString::from);
        Ok(session.with_tokens(SecretString::from(access_token), refresh_token))
    }

    /// Invalidate the session on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    pub async fn logout(&self, session: &Session) -> Result<()> {
        let body = RefreshBody {
            refresh_token: session.refresh_token().expose_secret(),
        };
        self.send_unit(Method::POST, "auth/logout", Some(&body), Some(session))
            .await?;
        info!("Logged out");
        Ok(())
    }

    /// Permanently delete the signed-in user's account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    pub async fn delete_account(&self, session: &Session) -> Result<()> {
        self.send_unit::<()>(Method::DELETE, "auth/account", None, Some(session))
            .await?;
        info!("Account deleted");
        Ok(())
    }
}
