//! Order calendar markings as JSON.
//!
//! The orders file holds the body of the orders endpoint: an array of order
//! objects, or an object wrapping it under `data`/`orders`.

use std::path::Path;

use cake_shop_client::ClientConfig;
use cake_shop_core::calendar::{MarkedDates, build_marked_dates};
use cake_shop_core::models::Order;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use super::{CommandError, connect, forget_expired, require_session};

/// Build markings from a saved orders export.
pub fn from_file(path: &Path, selected: Option<NaiveDate>) -> Result<(), CommandError> {
    let orders = read_orders(&std::fs::read_to_string(path)?)?;
    info!(count = orders.len(), path = %path.display(), "Loaded orders");

    let marked = build_marked_dates(&orders, selected);
    report_skipped(&marked);
    println!("{}", serde_json::to_string_pretty(&marked)?);
    Ok(())
}

/// Build markings from every order (admin only).
pub async fn from_api(config: &ClientConfig, selected: Option<NaiveDate>) -> Result<(), CommandError> {
    let (client, store) = connect(config)?;
    let session = require_session(&store)?;

    let marked = forget_expired(&store, client.order_calendar(&session, selected).await)?;
    println!("{}", serde_json::to_string_pretty(&marked)?);
    Ok(())
}

fn read_orders(json: &str) -> Result<Vec<Order>, CommandError> {
    let value: Value = serde_json::from_str(json)?;
    let list = match value {
        Value::Object(mut map) => map
            .remove("data")
            .or_else(|| map.remove("orders"))
            .unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    Ok(serde_json::from_value(list)?)
}

fn report_skipped(marked: &MarkedDates) {
    for order_id in marked.skipped() {
        warn!(order_id = %order_id, "Order has an unreadable date; left off the calendar");
    }
}
