//! Saved payment cards.
//!
//! Add and update validate the form locally first; a form with errors never
//! reaches the network. Only [`CardPayload`] is sent, so the CVV stays on the
//! device. Callers refresh their list with [`ApiClient::list_cards`] after a
//! mutation succeeds.

use cake_shop_core::CardId;
use cake_shop_core::card::{CardForm, CardPayload, CardRecord};
use reqwest::Method;
use tracing::{info, instrument, warn};

use super::{Listing, segment};
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::session::Session;

fn validated(form: &CardForm) -> Result<CardPayload> {
    form.validate().map_err(|errors| {
        warn!(errors = %errors, "Card form rejected before submission");
        ApiError::InvalidCard(errors)
    })
}

impl ApiClient {
    /// The signed-in user's saved cards.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn list_cards(&self, session: &Session) -> Result<Vec<CardRecord>> {
        Ok(self
            .get::<Listing<CardRecord>>("credit-cards", Some(session))
            .await?
            .into_vec())
    }

    /// Save a new card.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidCard` with every field error if the form
    /// fails validation (no request is made), otherwise an error if the API
    /// request fails.
    #[instrument(skip(self, session, form))]
    pub async fn add_card(&self, session: &Session, form: &CardForm) -> Result<()> {
        let payload = validated(form)?;
        self.send_unit(Method::POST, "credit-cards", Some(&payload), Some(session))
            .await?;
        info!("Card added");
        Ok(())
    }

    /// Replace a saved card's details.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidCard` if the form fails validation (no
    /// request is made), otherwise an error if the API request fails.
    #[instrument(skip(self, session, form), fields(card_id = %id))]
    pub async fn update_card(&self, session: &Session, id: &CardId, form: &CardForm) -> Result<()> {
        let payload = validated(form)?;
        let path = format!("credit-cards/{}", segment(id.as_str()));
        self.send_unit(Method::PUT, &path, Some(&payload), Some(session))
            .await?;
        info!("Card updated");
        Ok(())
    }

    /// Delete a saved card.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(card_id = %id))]
    pub async fn delete_card(&self, session: &Session, id: &CardId) -> Result<()> {
        let path = format!("credit-cards/{}", segment(id.as_str()));
        self.send_unit::<()>(Method::DELETE, &path, None, Some(session))
            .await
    }

    /// Make a saved card the default for checkout.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(card_id = %id))]
    pub async fn set_default_card(&self, session: &Session, id: &CardId) -> Result<()> {
        let path = format!("credit-cards/{}/default", segment(id.as_str()));
        self.send_unit::<()>(Method::PUT, &path, None, Some(session))
            .await
    }
}
