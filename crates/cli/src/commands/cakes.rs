//! Catalog listing.

use cake_shop_client::ClientConfig;
use cake_shop_core::catalog::{CakeQuery, CakeSort};

use super::{CommandError, connect};

/// Print cakes matching `search`, in `sort` order.
pub async fn list(
    config: &ClientConfig,
    search: Option<String>,
    sort: CakeSort,
) -> Result<(), CommandError> {
    let (client, _) = connect(config)?;
    let cakes = client.search_cakes(&CakeQuery { search, sort }).await?;

    if cakes.is_empty() {
        println!("No cakes found.");
        return Ok(());
    }
    for cake in &cakes {
        let availability = if cake.is_orderable() { "" } else { "  (sold out)" };
        println!("{:<32} {:>10}{availability}", cake.name, cake.price.display());
    }
    Ok(())
}
