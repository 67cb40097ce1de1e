//! Ingredient inventory and shop expenses (admin screens).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ExpenseId, InventoryItemId, Price};

/// Threshold used when the backend does not set one per item.
pub const DEFAULT_LOW_STOCK_THRESHOLD: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// An ingredient or packaging item tracked by the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(rename = "_id", alias = "id")]
    pub id: InventoryItemId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float", alias = "stock")]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub low_stock_threshold: Option<Decimal>,
}

impl InventoryItem {
    /// Whether the quantity is at or below the item's threshold.
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.quantity
            <= self
                .low_stock_threshold
                .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD)
    }
}

/// Body of an inventory update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryUpdate {
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub low_stock_threshold: Option<Decimal>,
}

/// A recorded shop expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(rename = "_id", alias = "id")]
    pub id: ExpenseId,
    #[serde(alias = "description")]
    pub title: String,
    pub amount: Price,
    #[serde(default)]
    pub category: Option<String>,
    pub date: String,
}

/// Body of an add-expense request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    pub title: String,
    pub amount: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub date: String,
}

/// Sum of all expense amounts.
#[must_use]
pub fn total_expenses(expenses: &[Expense]) -> Price {
    expenses.iter().map(|expense| expense.amount).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_low_stock_uses_default_threshold() {
        let items: Vec<InventoryItem> = serde_json::from_value(json!([
            {"_id": "i1", "name": "Flour", "quantity": 4.5, "unit": "kg"},
            {"_id": "i2", "name": "Sugar", "stock": 12, "unit": "kg"},
            {"_id": "i3", "name": "Eggs", "quantity": 20, "unit": "pcs", "lowStockThreshold": 24}
        ]))
        .unwrap();

        let low: Vec<_> = items
            .iter()
            .filter(|item| item.is_low_stock())
            .map(|item| item.name.as_str())
            .collect();
        assert_eq!(low, vec!["Flour", "Eggs"]);
    }

    #[test]
    fn test_total_expenses() {
        let expenses: Vec<Expense> = serde_json::from_value(json!([
            {"_id": "e1", "title": "Butter", "amount": 18.4, "date": "2025-06-01"},
            {"_id": "e2", "description": "Oven repair", "amount": 120, "date": "2025-06-02"}
        ]))
        .unwrap();

        assert_eq!(total_expenses(&expenses).display(), "$138.40");
    }
}
