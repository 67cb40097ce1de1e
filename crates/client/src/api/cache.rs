//! Cache types for catalog responses.

use cake_shop_core::CakeId;
use cake_shop_core::models::Cake;

/// Cache key for cake listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Cakes,
    Cake(CakeId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Cakes(Vec<Cake>),
    Cake(Box<Cake>),
}
