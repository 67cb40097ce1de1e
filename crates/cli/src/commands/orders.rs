//! The signed-in user's orders.

use cake_shop_client::ClientConfig;

use super::{CommandError, connect, forget_expired, require_session};

pub async fn list(config: &ClientConfig) -> Result<(), CommandError> {
    let (client, store) = connect(config)?;
    let session = require_session(&store)?;
    let orders = forget_expired(&store, client.my_orders(&session).await)?;

    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }
    for order in &orders {
        let placed = order
            .created_at_utc()
            .map_or_else(
                || order.created_at.clone().unwrap_or_default(),
                |at| at.format("%Y-%m-%d").to_string(),
            );
        println!(
            "{placed}  {:<10} {:>10}  {}",
            order.status.as_str(),
            order.total_price.display(),
            order.id
        );
    }
    Ok(())
}
