//! Checkout and the customer's own orders.

use cake_shop_core::catalog::sort_orders_newest_first;
use cake_shop_core::models::{Order, PlaceOrder};
use reqwest::Method;
use tracing::{info, instrument};

use super::{Listing, segment};
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::session::Session;

impl ApiClient {
    /// Turn the cart into an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails (e.g. the cart is empty).
    #[instrument(skip(self, session, order), fields(address_id = %order.address_id))]
    pub async fn place_order(&self, session: &Session, order: &PlaceOrder) -> Result<Order> {
        let placed: Order = self
            .send_json(Method::POST, "orders", order, Some(session))
            .await?;
        info!(order_id = %placed.id, total = %placed.total_price, "Order placed");
        Ok(placed)
    }

    /// The signed-in user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn my_orders(&self, session: &Session) -> Result<Vec<Order>> {
        let mut orders = self
            .get::<Listing<Order>>("orders/my-orders", Some(session))
            .await?
            .into_vec();
        sort_orders_newest_first(&mut orders);
        Ok(orders)
    }

    /// Cancel an order that has not been delivered yet.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` without sending anything if the
    /// order is already delivered or cancelled, otherwise an error if the
    /// API request fails.
    #[instrument(skip(self, session, order), fields(order_id = %order.id, status = %order.status))]
    pub async fn cancel_order(&self, session: &Session, order: &Order) -> Result<Order> {
        if !order.status.is_cancellable() {
            return Err(ApiError::InvalidInput(format!(
                "Orders that are {} cannot be cancelled",
                order.status
            )));
        }
        let path = format!("orders/{}/cancel", segment(order.id.as_str()));
        let cancelled: Order = self.fetch(Method::PUT, &path, Some(session)).await?;
        info!("Order cancelled");
        Ok(cancelled)
    }
}
