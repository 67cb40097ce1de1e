//! Client-side search and sorting used by the list screens.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::models::{Cake, InventoryItem, Order};

/// Sort order for the cake grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CakeSort {
    /// Keep the backend's order.
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    Name,
}

impl std::str::FromStr for CakeSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "featured" => Ok(Self::Featured),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            "name" => Ok(Self::Name),
            _ => Err(format!(
                "invalid sort: {s} (expected featured, price-asc, price-desc or name)"
            )),
        }
    }
}

/// Search box plus sort picker of the cake list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CakeQuery {
    pub search: Option<String>,
    pub sort: CakeSort,
}

impl CakeQuery {
    /// Whether a cake matches the search text.
    ///
    /// Case-insensitive substring match on name, description and category.
    /// A blank search matches everything.
    #[must_use]
    pub fn matches(&self, cake: &Cake) -> bool {
        let Some(needle) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return true;
        };
        let needle = needle.to_lowercase();

        [
            Some(cake.name.as_str()),
            Some(cake.description.as_str()),
            cake.category.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Filter and sort `cakes`. Ties keep their original order.
    #[must_use]
    pub fn apply<'a>(&self, cakes: &'a [Cake]) -> Vec<&'a Cake> {
        let mut matched: Vec<&Cake> = cakes.iter().filter(|cake| self.matches(cake)).collect();
        match self.sort {
            CakeSort::Featured => {}
            CakeSort::PriceAsc => matched.sort_by_key(|cake| cake.price),
            CakeSort::PriceDesc => matched.sort_by_key(|cake| Reverse(cake.price)),
            CakeSort::Name => matched.sort_by_cached_key(|cake| cake.name.to_lowercase()),
        }
        matched
    }
}

/// Sort order for the inventory screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockSort {
    /// Lowest stock first, so items to reorder are on top.
    #[default]
    LowestFirst,
    HighestFirst,
}

/// Sort inventory items by quantity in place.
pub fn sort_inventory(items: &mut [InventoryItem], order: StockSort) {
    match order {
        StockSort::LowestFirst => items.sort_by_key(|item| item.quantity),
        StockSort::HighestFirst => items.sort_by_key(|item| Reverse(item.quantity)),
    }
}

/// Sort orders newest first by creation time; unparseable dates go last.
pub fn sort_orders_newest_first(orders: &mut [Order]) {
    orders.sort_by_key(|order| Reverse(order.created_at_utc()));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::{CakeId, InventoryItemId, OrderId, OrderStatus, Price};

    fn cake(id: &str, name: &str, cents: i64, category: Option<&str>) -> Cake {
        Cake {
            id: CakeId::new(id),
            name: name.to_string(),
            description: format!("A lovely {name}"),
            price: Price::from_cents(cents),
            image_url: None,
            category: category.map(String::from),
            stock: None,
            is_available: true,
        }
    }

    fn names<'a>(cakes: &[&'a Cake]) -> Vec<&'a str> {
        cakes.iter().map(|cake| cake.name.as_str()).collect()
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let cakes = vec![
            cake("1", "Chocolate Fudge", 3000, Some("chocolate")),
            cake("2", "Lemon Drizzle", 2200, Some("fruit")),
            cake("3", "Carrot", 2500, Some("Classic")),
        ];

        let query = CakeQuery {
            search: Some("  CLASSIC ".to_string()),
            sort: CakeSort::Featured,
        };
        assert_eq!(names(&query.apply(&cakes)), vec!["Carrot"]);

        let query = CakeQuery {
            search: Some("lovely lemon".to_string()),
            ..CakeQuery::default()
        };
        assert_eq!(names(&query.apply(&cakes)), vec!["Lemon Drizzle"]);
    }

    #[test]
    fn test_blank_search_matches_all_and_sorts() {
        let cakes = vec![
            cake("1", "b cake", 3000, None),
            cake("2", "A cake", 2200, None),
            cake("3", "c cake", 2500, None),
        ];

        let by_price = CakeQuery {
            search: Some("   ".to_string()),
            sort: CakeSort::PriceAsc,
        };
        assert_eq!(names(&by_price.apply(&cakes)), vec!["A cake", "c cake", "b cake"]);

        let by_price_desc = CakeQuery {
            search: None,
            sort: CakeSort::PriceDesc,
        };
        assert_eq!(
            names(&by_price_desc.apply(&cakes)),
            vec!["b cake", "c cake", "A cake"]
        );

        let by_name = CakeQuery {
            search: None,
            sort: CakeSort::Name,
        };
        assert_eq!(names(&by_name.apply(&cakes)), vec!["A cake", "b cake", "c cake"]);
    }

    #[test]
    fn test_cake_sort_from_str() {
        assert_eq!("price-desc".parse::<CakeSort>().unwrap(), CakeSort::PriceDesc);
        assert!("cheapest".parse::<CakeSort>().is_err());
    }

    #[test]
    fn test_sort_inventory() {
        let item = |id: &str, qty: i64| InventoryItem {
            id: InventoryItemId::new(id),
            name: id.to_string(),
            quantity: Decimal::new(qty, 0),
            unit: "kg".to_string(),
            low_stock_threshold: None,
        };
        let mut items = vec![item("flour", 10), item("sugar", 2), item("butter", 6)];

        sort_inventory(&mut items, StockSort::LowestFirst);
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["sugar", "butter", "flour"]);

        sort_inventory(&mut items, StockSort::HighestFirst);
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["flour", "butter", "sugar"]);
    }

    #[test]
    fn test_sort_orders_newest_first() {
        let order = |id: &str, created_at: &str| Order {
            id: OrderId::new(id),
            user_id: None,
            items: Vec::new(),
            status: OrderStatus::Pending,
            total_price: Price::ZERO,
            created_at: Some(created_at.to_string()),
            delivery_date: None,
            delivery_address: None,
            notes: None,
        };
        let mut orders = vec![
            order("old", "2025-01-01T00:00:00Z"),
            order("broken", "???"),
            order("new", "2025-06-01T00:00:00Z"),
        ];

        sort_orders_newest_first(&mut orders);
        let ids: Vec<_> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "broken"]);
    }
}
