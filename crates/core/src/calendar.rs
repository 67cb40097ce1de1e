//! Order calendar marking for the admin dashboard.
//!
//! [`build_marked_dates`] folds an order list into the structure the calendar
//! widget consumes: one entry per `YYYY-MM-DD` key, each holding a set of
//! colored dots (one per distinct order status that day) and, for the date the
//! admin tapped, a selection highlight.
//!
//! # Rules
//!
//! - Only orders with a delivery date, or pending orders, are marked.
//! - The marking day is the delivery date when present, else the creation date,
//!   truncated to the UTC calendar day.
//! - Orders whose marking date does not parse are skipped, never an error.
//! - A day holds at most one dot per color.
//! - Selection is merged on top of the day's dots and never removes them.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{Order, parse_timestamp};
use crate::types::{OrderId, OrderStatus};

/// Dot color for pending orders.
pub const PENDING_COLOR: &str = "orange";
/// Dot color for confirmed orders.
pub const CONFIRMED_COLOR: &str = "blue";
/// Dot color for delivered orders.
pub const DELIVERED_COLOR: &str = "green";
/// Dot color for cancelled orders.
pub const CANCELLED_COLOR: &str = "red";
/// Dot color for any status the dashboard does not know.
pub const FALLBACK_COLOR: &str = "#8B4513";
/// Background of the selected day.
pub const SELECTED_COLOR: &str = "#D2691E";

/// Key format used by the calendar widget.
const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Fixed color for an order status.
#[must_use]
pub fn status_color(status: &OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => PENDING_COLOR,
        OrderStatus::Confirmed => CONFIRMED_COLOR,
        OrderStatus::Delivered => DELIVERED_COLOR,
        OrderStatus::Cancelled => CANCELLED_COLOR,
        OrderStatus::Other(_) => FALLBACK_COLOR,
    }
}

/// One status indicator under a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dot {
    pub color: &'static str,
}

/// Marking for a single calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateMarking {
    pub marked: bool,
    pub dots: Vec<Dot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<&'static str>,
}

impl DateMarking {
    fn push_dot(&mut self, color: &'static str) {
        self.marked = true;
        if !self.dots.iter().any(|dot| dot.color == color) {
            self.dots.push(Dot { color });
        }
    }

    /// Whether this day is the selected one.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected.unwrap_or(false)
    }
}

/// Calendar markings keyed by `YYYY-MM-DD`.
///
/// Serializes as the bare map the calendar widget expects. The ids of orders
/// that were skipped for malformed dates are available through
/// [`MarkedDates::skipped`] so callers can decide whether to log them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MarkedDates {
    entries: BTreeMap<String, DateMarking>,
    #[serde(skip)]
    skipped: Vec<OrderId>,
}

impl MarkedDates {
    /// Marking for a `YYYY-MM-DD` key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DateMarking> {
        self.entries.get(key)
    }

    /// Marking for a date.
    #[must_use]
    pub fn get_date(&self, date: NaiveDate) -> Option<&DateMarking> {
        self.entries.get(&date_key(date))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in date order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DateMarking)> {
        self.entries.iter().map(|(key, marking)| (key.as_str(), marking))
    }

    /// Orders left off the calendar because their date did not parse.
    #[must_use]
    pub fn skipped(&self) -> &[OrderId] {
        &self.skipped
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Whether an order takes part in calendar marking at all.
fn is_markable(order: &Order) -> bool {
    order.delivery_date.is_some() || order.status == OrderStatus::Pending
}

/// The instant an order is marked at: delivery date if present, else creation.
///
/// A present but malformed delivery date yields `None`; it does not fall back
/// to the creation date.
fn marking_instant(order: &Order) -> Option<DateTime<Utc>> {
    match order.delivery_date.as_deref() {
        Some(delivery) => parse_timestamp(delivery),
        None => order.created_at_utc(),
    }
}

/// Build the calendar marking map for `orders`.
///
/// `selected_date` is merged into its entry (creating an unmarked entry if
/// that day has no orders). The input slice is not modified.
#[must_use]
pub fn build_marked_dates(orders: &[Order], selected_date: Option<NaiveDate>) -> MarkedDates {
    let mut marked = MarkedDates::default();

    for order in orders.iter().filter(|order| is_markable(order)) {
        let Some(instant) = marking_instant(order) else {
            marked.skipped.push(order.id.clone());
            continue;
        };

        marked
            .entries
            .entry(date_key(instant.date_naive()))
            .or_default()
            .push_dot(status_color(&order.status));
    }

    if let Some(date) = selected_date {
        let entry = marked.entries.entry(date_key(date)).or_default();
        entry.selected = Some(true);
        entry.selected_color = Some(SELECTED_COLOR);
    }

    marked
}

/// Orders shown in the list under a selected calendar day.
///
/// Uses the same inclusion and marking-date rules as [`build_marked_dates`],
/// so the list always matches the dots.
#[must_use]
pub fn orders_on(orders: &[Order], date: NaiveDate) -> Vec<&Order> {
    orders
        .iter()
        .filter(|order| is_markable(order))
        .filter(|order| marking_instant(order).is_some_and(|at| at.date_naive() == date))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Price;

    fn order(id: &str, status: &str, created_at: &str, delivery_date: Option<&str>) -> Order {
        Order {
            id: OrderId::new(id),
            user_id: None,
            items: Vec::new(),
            status: status.parse().unwrap(),
            total_price: Price::from_cents(2500),
            created_at: Some(created_at.to_string()),
            delivery_date: delivery_date.map(String::from),
            delivery_address: None,
            notes: None,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_same_day_same_status_collapses_to_one_dot() {
        let orders = vec![
            order("o1", "pending", "2025-06-20T09:00:00.000Z", None),
            order("o2", "pending", "2025-06-20T17:30:00.000Z", None),
        ];

        let marked = build_marked_dates(&orders, None);
        let entry = marked.get("2025-06-20").unwrap();
        assert!(entry.marked);
        assert_eq!(entry.dots, vec![Dot { color: PENDING_COLOR }]);
    }

    #[test]
    fn test_distinct_statuses_get_distinct_dots_in_order() {
        let orders = vec![
            order("o1", "confirmed", "2025-06-01T00:00:00Z", Some("2025-06-20T10:00:00Z")),
            order("o2", "Delivered", "2025-06-02T00:00:00Z", Some("2025-06-20T12:00:00Z")),
            order("o3", "CONFIRMED", "2025-06-03T00:00:00Z", Some("2025-06-20T15:00:00Z")),
            order("o4", "cancelled", "2025-06-04T00:00:00Z", Some("2025-06-20T16:00:00Z")),
        ];

        let marked = build_marked_dates(&orders, None);
        let colors: Vec<_> = marked
            .get("2025-06-20")
            .unwrap()
            .dots
            .iter()
            .map(|dot| dot.color)
            .collect();
        assert_eq!(colors, vec![CONFIRMED_COLOR, DELIVERED_COLOR, CANCELLED_COLOR]);
    }

    #[test]
    fn test_unscheduled_non_pending_orders_are_excluded() {
        let orders = vec![
            order("o1", "confirmed", "2025-06-20T10:00:00Z", None),
            order("o2", "delivered", "2025-06-21T10:00:00Z", None),
        ];

        let marked = build_marked_dates(&orders, None);
        assert!(marked.is_empty());
        assert!(marked.skipped().is_empty());
    }

    #[test]
    fn test_delivery_date_wins_over_created_at() {
        let orders = vec![order(
            "o1",
            "pending",
            "2025-06-01T10:00:00Z",
            Some("2025-06-25T10:00:00Z"),
        )];

        let marked = build_marked_dates(&orders, None);
        assert!(marked.get("2025-06-01").is_none());
        assert!(marked.get("2025-06-25").is_some());
    }

    #[test]
    fn test_key_is_utc_day() {
        let orders = vec![order(
            "o1",
            "confirmed",
            "2025-06-01T10:00:00Z",
            Some("2025-06-20T22:30:00-05:00"),
        )];

        let marked = build_marked_dates(&orders, None);
        assert!(marked.get_date(day("2025-06-21")).is_some());
    }

    #[test]
    fn test_unknown_status_uses_fallback_color() {
        let orders = vec![order(
            "o1",
            "baking",
            "2025-06-01T10:00:00Z",
            Some("2025-06-20"),
        )];

        let marked = build_marked_dates(&orders, None);
        assert_eq!(
            marked.get("2025-06-20").unwrap().dots,
            vec![Dot { color: FALLBACK_COLOR }]
        );
    }

    #[test]
    fn test_near_miss_statuses_use_fallback_color() {
        let orders = vec![
            order("o1", "canceled", "2025-06-01T10:00:00Z", Some("2025-06-20")),
            order("o2", "Confirmed ", "2025-06-01T10:00:00Z", Some("2025-06-20")),
            order("o3", "DELIVERED", "2025-06-01T10:00:00Z", Some("2025-06-20")),
        ];

        let marked = build_marked_dates(&orders, None);
        assert_eq!(
            marked.get("2025-06-20").unwrap().dots,
            vec![Dot { color: FALLBACK_COLOR }, Dot { color: DELIVERED_COLOR }]
        );
    }

    #[test]
    fn test_malformed_dates_are_skipped() {
        let orders = vec![
            order("bad", "confirmed", "2025-06-01T10:00:00Z", Some("next tuesday")),
            order("bad-pending", "pending", "garbage", None),
            order("good", "pending", "2025-06-02T10:00:00Z", None),
        ];

        let marked = build_marked_dates(&orders, None);
        assert_eq!(marked.len(), 1);
        assert!(marked.get("2025-06-02").is_some());
        assert_eq!(
            marked.skipped(),
            &[OrderId::new("bad"), OrderId::new("bad-pending")]
        );
    }

    #[test]
    fn test_missing_created_at_uses_delivery_date_or_is_skipped() {
        let legacy = Order {
            created_at: None,
            ..order("legacy", "confirmed", "", Some("2025-06-21"))
        };
        let undated = Order {
            created_at: None,
            ..order("undated", "pending", "", None)
        };
        let numeric: Order = serde_json::from_value(serde_json::json!({
            "_id": "numeric",
            "status": "confirmed",
            "totalPrice": 10,
            "deliveryDate": 20_250_621
        }))
        .unwrap();

        let marked = build_marked_dates(&[legacy, undated, numeric], None);
        assert_eq!(marked.len(), 1);
        assert_eq!(
            marked.get("2025-06-21").unwrap().dots,
            vec![Dot { color: CONFIRMED_COLOR }]
        );
        assert_eq!(
            marked.skipped(),
            &[OrderId::new("undated"), OrderId::new("numeric")]
        );
    }

    #[test]
    fn test_selection_preserves_dots() {
        let orders = vec![
            order("o1", "pending", "2025-06-20T09:00:00Z", None),
            order("o2", "confirmed", "2025-06-01T09:00:00Z", Some("2025-06-20T12:00:00Z")),
        ];

        let before = build_marked_dates(&orders, None);
        let after = build_marked_dates(&orders, Some(day("2025-06-20")));

        let before_entry = before.get("2025-06-20").unwrap();
        let after_entry = after.get("2025-06-20").unwrap();
        assert_eq!(before_entry.dots.len(), after_entry.dots.len());
        assert_eq!(before_entry.dots, after_entry.dots);
        assert!(after_entry.marked);
        assert!(after_entry.is_selected());
        assert_eq!(after_entry.selected_color, Some(SELECTED_COLOR));
    }

    #[test]
    fn test_selecting_empty_day_adds_unmarked_entry() {
        let marked = build_marked_dates(&[], Some(day("2025-07-04")));
        let entry = marked.get("2025-07-04").unwrap();
        assert!(!entry.marked);
        assert!(entry.dots.is_empty());
        assert!(entry.is_selected());
    }

    #[test]
    fn test_serializes_as_calendar_map() {
        let orders = vec![order("o1", "pending", "2025-06-20T09:00:00Z", None)];
        let marked = build_marked_dates(&orders, Some(day("2025-06-21")));

        let json = serde_json::to_value(&marked).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "2025-06-20": {"marked": true, "dots": [{"color": "orange"}]},
                "2025-06-21": {
                    "marked": false,
                    "dots": [],
                    "selected": true,
                    "selectedColor": SELECTED_COLOR
                }
            })
        );
    }

    #[test]
    fn test_orders_on_matches_marking_rules() {
        let orders = vec![
            order("o1", "pending", "2025-06-20T09:00:00Z", None),
            order("o2", "confirmed", "2025-06-20T09:00:00Z", None),
            order("o3", "confirmed", "2025-06-01T09:00:00Z", Some("2025-06-20T18:00:00Z")),
            order("o4", "pending", "2025-06-19T09:00:00Z", None),
        ];

        let ids: Vec<_> = orders_on(&orders, day("2025-06-20"))
            .into_iter()
            .map(|order| order.id.as_str())
            .collect();
        assert_eq!(ids, vec!["o1", "o3"]);
    }
}
