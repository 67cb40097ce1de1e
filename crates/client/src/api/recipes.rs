//! Recipe listing. Recipes are normalized on decode (see
//! [`cake_shop_core::recipe`]).

use cake_shop_core::RecipeId;
use cake_shop_core::recipe::Recipe;
use tracing::instrument;

use super::{Listing, segment};
use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// All published recipes.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_recipes(&self) -> Result<Vec<Recipe>> {
        Ok(self.get::<Listing<Recipe>>("recipes", None).await?.into_vec())
    }

    /// A single recipe.
    ///
    /// # Errors
    ///
    /// Returns an error if the recipe does not exist or the API request fails.
    #[instrument(skip(self), fields(recipe_id = %id))]
    pub async fn get_recipe(&self, id: &RecipeId) -> Result<Recipe> {
        self.get(&format!("recipes/{}", segment(id.as_str())), None)
            .await
    }
}
