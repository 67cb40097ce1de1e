//! Backend endpoint groups.
//!
//! Each submodule adds one `impl ApiClient` block:
//!
//! - [`auth`] - Registration, login with two-factor, refresh, logout
//! - [`cakes`] - Cake catalog (cached)
//! - [`cart`] - Shopping cart
//! - [`orders`] - Checkout and the customer's orders
//! - [`recipes`] - Recipe listing
//! - [`addresses`] - Delivery addresses
//! - [`cards`] - Saved payment cards
//! - [`notifications`] - In-app notifications
//! - [`admin`] - Users, orders, calendar, inventory, expenses, recipes

pub mod addresses;
pub mod admin;
pub mod auth;
pub(crate) mod cache;
pub mod cakes;
pub mod cards;
pub mod cart;
pub mod notifications;
pub mod orders;
pub mod recipes;

use serde::Deserialize;

/// A list response. Most routes return a bare array; some wrap it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(alias = "items", alias = "results", alias = "orders")]
        data: Vec<T>,
    },
}

impl<T> Listing<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { data: items } => items,
        }
    }
}

/// Percent-encode one path segment.
pub(crate) fn segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_accepts_both_shapes() {
        let bare: Listing<u32> = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(bare.into_vec(), vec![1, 2]);

        let wrapped: Listing<u32> = serde_json::from_str(r#"{"data": [3]}"#).unwrap();
        assert_eq!(wrapped.into_vec(), vec![3]);

        let items: Listing<u32> = serde_json::from_str(r#"{"items": [4], "total": 1}"#).unwrap();
        assert_eq!(items.into_vec(), vec![4]);

        let orders: Listing<u32> = serde_json::from_str(r#"{"orders": [5, 6]}"#).unwrap();
        assert_eq!(orders.into_vec(), vec![5, 6]);
    }

    #[test]
    fn test_segment_escapes_separators() {
        assert_eq!(segment("abc123"), "abc123");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }
}
