//! Headline numbers for the admin dashboard.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::Order;
use crate::types::{OrderStatus, Price};

/// Order counts and revenue across an order list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_orders: usize,
    /// Count per status, keyed by the lowercase status name.
    pub by_status: BTreeMap<String, usize>,
    /// Sum of totals of every order that was not cancelled.
    pub revenue: Price,
}

impl DashboardSummary {
    #[must_use]
    pub fn from_orders(orders: &[Order]) -> Self {
        let mut summary = Self {
            total_orders: orders.len(),
            ..Self::default()
        };

        for order in orders {
            *summary
                .by_status
                .entry(order.status.as_str().to_string())
                .or_insert(0) += 1;
            if order.status != OrderStatus::Cancelled {
                summary.revenue = summary.revenue + order.total_price;
            }
        }

        summary
    }

    /// Number of orders with the given status.
    #[must_use]
    pub fn count(&self, status: &OrderStatus) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }

    /// Orders waiting for confirmation.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.count(&OrderStatus::Pending)
    }
}
