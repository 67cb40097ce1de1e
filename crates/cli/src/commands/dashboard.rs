//! Admin dashboard: order counts, revenue and today's calendar entry.

use cake_shop_client::ClientConfig;
use cake_shop_core::OrderStatus;
use cake_shop_core::calendar::{build_marked_dates, orders_on};
use cake_shop_core::dashboard::DashboardSummary;
use chrono::Utc;
use tracing::warn;

use super::{CommandError, connect, forget_expired, require_session};

pub async fn show(config: &ClientConfig) -> Result<(), CommandError> {
    let (client, store) = connect(config)?;
    let session = require_session(&store)?;
    let orders = forget_expired(&store, client.list_all_orders(&session).await)?;

    let summary = DashboardSummary::from_orders(&orders);
    println!("Orders:    {}", summary.total_orders);
    for status in &OrderStatus::ASSIGNABLE {
        println!("  {:<10} {}", status.as_str(), summary.count(status));
    }
    println!("Revenue:   {}", summary.revenue.display());

    let today = Utc::now().date_naive();
    let marked = build_marked_dates(&orders, Some(today));
    for order_id in marked.skipped() {
        warn!(order_id = %order_id, "Order has an unreadable date; left off the calendar");
    }

    let due = orders_on(&orders, today);
    let dots = marked
        .get_date(today)
        .map(|day| day.dots.iter().map(|dot| dot.color).collect::<Vec<_>>().join(", "))
        .unwrap_or_default();
    println!("Today ({today}): {} order(s) [{dots}]", due.len());
    for order in due {
        println!("  {}  {}  {}", order.id, order.status, order.total_price.display());
    }
    Ok(())
}
