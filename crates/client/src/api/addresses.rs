//! Delivery addresses.

use cake_shop_core::AddressId;
use cake_shop_core::models::{Address, AddressInput};
use reqwest::Method;
use tracing::instrument;

use super::{Listing, segment};
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::session::Session;

/// Reject an address form with blank required fields before sending it.
fn check_address(input: &AddressInput) -> Result<()> {
    let missing = input.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::InvalidInput(format!(
            "Please fill in: {}",
            missing.join(", ")
        )))
    }
}

impl ApiClient {
    /// The signed-in user's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn list_addresses(&self, session: &Session) -> Result<Vec<Address>> {
        Ok(self
            .get::<Listing<Address>>("addresses", Some(session))
            .await?
            .into_vec())
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` without sending anything if a
    /// required field is blank, otherwise an error if the API request fails.
    #[instrument(skip(self, session, input))]
    pub async fn add_address(&self, session: &Session, input: &AddressInput) -> Result<Address> {
        check_address(input)?;
        self.send_json(Method::POST, "addresses", input, Some(session))
            .await
    }

    /// Replace a saved address.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` without sending anything if a
    /// required field is blank, otherwise an error if the API request fails.
    #[instrument(skip(self, session, input), fields(address_id = %id))]
    pub async fn update_address(
        &self,
        session: &Session,
        id: &AddressId,
        input: &AddressInput,
    ) -> Result<Address> {
        check_address(input)?;
        let path = format!("addresses/{}", segment(id.as_str()));
        self.send_json(Method::PUT, &path, input, Some(session))
            .await
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(address_id = %id))]
    pub async fn delete_address(&self, session: &Session, id: &AddressId) -> Result<()> {
        let path = format!("addresses/{}", segment(id.as_str()));
        self.send_unit::<()>(Method::DELETE, &path, None, Some(session))
            .await
    }
}
