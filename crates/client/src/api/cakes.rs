//! Cake catalog.
//!
//! Listings and single cakes are cached in memory (see
//! [`crate::ClientConfig::cache_ttl`]). Search and sorting run locally over
//! the cached listing.

use cake_shop_core::CakeId;
use cake_shop_core::catalog::CakeQuery;
use cake_shop_core::models::Cake;
use tracing::{debug, instrument};

use super::Listing;
use super::cache::{CacheKey, CacheValue};
use super::segment;
use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// All cakes in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_cakes(&self) -> Result<Vec<Cake>> {
        if let Some(CacheValue::Cakes(cakes)) = self.cache().get(&CacheKey::Cakes).await {
            debug!("Cache hit for cake listing");
            return Ok(cakes);
        }

        let cakes = self.get::<Listing<Cake>>("cakes", None).await?.into_vec();
        debug!(count = cakes.len(), "Fetched cake listing");

        self.cache()
            .insert(CacheKey::Cakes, CacheValue::Cakes(cakes.clone()))
            .await;

        Ok(cakes)
    }

    /// A single cake.
    ///
    /// # Errors
    ///
    /// Returns an error if the cake does not exist or the API request fails.
    #[instrument(skip(self), fields(cake_id = %id))]
    pub async fn get_cake(&self, id: &CakeId) -> Result<Cake> {
        let key = CacheKey::Cake(id.clone());
        if let Some(CacheValue::Cake(cake)) = self.cache().get(&key).await {
            debug!("Cache hit for cake");
            return Ok(*cake);
        }

        let cake: Cake = self
            .get(&format!("cakes/{}", segment(id.as_str())), None)
            .await?;

        self.cache()
            .insert(key, CacheValue::Cake(Box::new(cake.clone())))
            .await;

        Ok(cake)
    }

    /// Cakes matching a search, in the requested order.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    #[instrument(skip(self))]
    pub async fn search_cakes(&self, query: &CakeQuery) -> Result<Vec<Cake>> {
        let cakes = self.list_cakes().await?;
        Ok(query.apply(&cakes).into_iter().cloned().collect())
    }

    /// Drop every cached catalog entry.
    pub fn invalidate_catalog(&self) {
        self.cache().invalidate_all();
    }
}
