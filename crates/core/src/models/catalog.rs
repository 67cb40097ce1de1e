//! Cakes and the shopping cart.

use serde::{Deserialize, Serialize};

use crate::types::{CakeId, CartItemId, Price};

const fn default_true() -> bool {
    true
}

/// A cake listed in the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cake {
    #[serde(rename = "_id", alias = "id")]
    pub id: CakeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Units left; `None` when the backend does not track stock for the cake.
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

impl Cake {
    /// Whether the cake can be added to a cart right now.
    #[must_use]
    pub fn is_orderable(&self) -> bool {
        self.is_available && self.stock.is_none_or(|stock| stock > 0)
    }
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(rename = "_id", alias = "id")]
    pub id: CartItemId,
    #[serde(alias = "cake")]
    pub cake_id: CakeId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CartItem {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// The signed-in user's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Sum of all line totals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total number of units across lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_cake_deserializes_backend_shape() {
        let cake: Cake = serde_json::from_value(json!({
            "_id": "c1",
            "name": "Black Forest",
            "price": 32.5,
            "image": "https://cdn.example/bf.jpg",
            "stock": 0
        }))
        .unwrap();

        assert_eq!(cake.id.as_str(), "c1");
        assert_eq!(cake.price.display(), "$32.50");
        assert_eq!(cake.image_url.as_deref(), Some("https://cdn.example/bf.jpg"));
        assert!(cake.is_available);
        assert!(!cake.is_orderable());
    }

    #[test]
    fn test_cart_totals() {
        let cart: Cart = serde_json::from_value(json!({
            "items": [
                {"_id": "i1", "cakeId": "c1", "name": "Red Velvet", "price": 20, "quantity": 2},
                {"_id": "i2", "cakeId": "c2", "name": "Cheesecake", "price": 12.25, "quantity": 1}
            ]
        }))
        .unwrap();

        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total().display(), "$52.25");
    }
}
