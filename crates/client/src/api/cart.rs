//! Shopping cart. Every mutation returns the cart as the backend now has it.

use cake_shop_core::models::Cart;
use cake_shop_core::{CakeId, CartItemId};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::segment;
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::session::Session;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddToCart<'a> {
    cake_id: &'a CakeId,
    quantity: u32,
}

#[derive(Serialize)]
struct SetQuantity {
    quantity: u32,
}

impl ApiClient {
    /// The signed-in user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn get_cart(&self, session: &Session) -> Result<Cart> {
        self.get("cart", Some(session)).await
    }

    /// Add units of a cake to the cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for a zero quantity, otherwise an
    /// error if the API request fails.
    #[instrument(skip(self, session), fields(cake_id = %cake_id))]
    pub async fn add_to_cart(
        &self,
        session: &Session,
        cake_id: &CakeId,
        quantity: u32,
    ) -> Result<Cart> {
        if quantity == 0 {
            return Err(ApiError::InvalidInput(
                "Quantity must be at least 1".to_string(),
            ));
        }
        let body = AddToCart { cake_id, quantity };
        self.send_json(Method::POST, "cart/items", &body, Some(session))
            .await
    }

    /// Change the quantity of a cart line. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(item_id = %item_id))]
    pub async fn update_cart_item(
        &self,
        session: &Session,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<Cart> {
        if quantity == 0 {
            return self.remove_cart_item(session, item_id).await;
        }
        let path = format!("cart/items/{}", segment(item_id.as_str()));
        self.send_json(Method::PUT, &path, &SetQuantity { quantity }, Some(session))
            .await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(item_id = %item_id))]
    pub async fn remove_cart_item(&self, session: &Session, item_id: &CartItemId) -> Result<Cart> {
        let path = format!("cart/items/{}", segment(item_id.as_str()));
        self.fetch(Method::DELETE, &path, Some(session)).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn clear_cart(&self, session: &Session) -> Result<()> {
        self.send_unit::<()>(Method::DELETE, "cart", None, Some(session))
            .await
    }
}
