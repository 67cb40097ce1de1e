//! Admin operations: users, all orders, the order calendar, inventory,
//! expenses and recipe management.
//!
//! Every method checks the session role first and returns
//! `ApiError::Forbidden` without sending a request for non-admin sessions.

use cake_shop_core::calendar::{MarkedDates, build_marked_dates};
use cake_shop_core::models::{Expense, ExpenseInput, InventoryItem, InventoryUpdate, Order, User};
use cake_shop_core::recipe::{Recipe, RecipeInput};
use cake_shop_core::{ExpenseId, InventoryItemId, OrderId, OrderStatus, RecipeId, UserId, UserRole};
use chrono::NaiveDate;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::{Listing, segment};
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::session::Session;

#[derive(Serialize)]
struct RoleBody {
    role: UserRole,
}

#[derive(Serialize)]
struct StatusBody<'a> {
    status: &'a OrderStatus,
}

fn check_recipe(input: &RecipeInput) -> Result<()> {
    if input.title.trim().is_empty() {
        return Err(ApiError::InvalidInput("Recipe title is required".to_string()));
    }
    Ok(())
}

impl ApiClient {
    // =========================================================================
    // Users
    // =========================================================================

    /// Every registered user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions, or an error if
    /// the API request fails.
    #[instrument(skip(self, session))]
    pub async fn list_users(&self, session: &Session) -> Result<Vec<User>> {
        Self::require_admin(session)?;
        Ok(self
            .get::<Listing<User>>("admin/users", Some(session))
            .await?
            .into_vec())
    }

    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions, or an error if
    /// the API request fails.
    #[instrument(skip(self, session), fields(user_id = %id))]
    pub async fn delete_user(&self, session: &Session, id: &UserId) -> Result<()> {
        Self::require_admin(session)?;
        if id == session.user_id() {
            return Err(ApiError::InvalidInput(
                "Use account deletion to remove your own account".to_string(),
            ));
        }
        let path = format!("admin/users/{}", segment(id.as_str()));
        self.send_unit::<()>(Method::DELETE, &path, None, Some(session))
            .await?;
        info!("User deleted");
        Ok(())
    }

    /// Promote or demote a user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions, or an error if
    /// the API request fails.
    #[instrument(skip(self, session), fields(user_id = %id, role = %role))]
    pub async fn update_user_role(
        &self,
        session: &Session,
        id: &UserId,
        role: UserRole,
    ) -> Result<()> {
        Self::require_admin(session)?;
        let path = format!("admin/users/{}/role", segment(id.as_str()));
        self.send_unit(Method::PUT, &path, Some(&RoleBody { role }), Some(session))
            .await?;
        info!("User role updated");
        Ok(())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Orders from every customer.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions, or an error if
    /// the API request fails.
    #[instrument(skip(self, session))]
    pub async fn list_all_orders(&self, session: &Session) -> Result<Vec<Order>> {
        Self::require_admin(session)?;
        Ok(self
            .get::<Listing<Order>>("admin/orders", Some(session))
            .await?
            .into_vec())
    }

    /// Move an order to another status.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions,
    /// `ApiError::InvalidInput` for a status outside
    /// [`OrderStatus::ASSIGNABLE`], or an error if the API request fails.
    #[instrument(skip(self, session), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        session: &Session,
        id: &OrderId,
        status: &OrderStatus,
    ) -> Result<Order> {
        Self::require_admin(session)?;
        if !OrderStatus::ASSIGNABLE.contains(status) {
            return Err(ApiError::InvalidInput(format!(
                "Unknown order status '{status}'"
            )));
        }
        let path = format!("admin/orders/{}/status", segment(id.as_str()));
        let order: Order = self
            .send_json(Method::PUT, &path, &StatusBody { status }, Some(session))
            .await?;
        info!("Order status updated");
        Ok(order)
    }

    /// Calendar markings for every order, with `selected` highlighted.
    ///
    /// Orders with unreadable dates are left off the calendar and logged.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions, or an error if
    /// the orders cannot be fetched.
    #[instrument(skip(self, session))]
    pub async fn order_calendar(
        &self,
        session: &Session,
        selected: Option<NaiveDate>,
    ) -> Result<MarkedDates> {
        let orders = self.list_all_orders(session).await?;
        let marked = build_marked_dates(&orders, selected);
        for order_id in marked.skipped() {
            warn!(order_id = %order_id, "Order has an unreadable date; left off the calendar");
        }
        Ok(marked)
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions, or an error if
    /// the API request fails.
    #[instrument(skip(self, session))]
    pub async fn list_inventory(&self, session: &Session) -> Result<Vec<InventoryItem>> {
        Self::require_admin(session)?;
        Ok(self
            .get::<Listing<InventoryItem>>("admin/inventory", Some(session))
            .await?
            .into_vec())
    }

    /// Set the stock level of an ingredient or supply.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions,
    /// `ApiError::InvalidInput` for a negative quantity, or an error if the
    /// API request fails.
    #[instrument(skip(self, session, update), fields(item_id = %id))]
    pub async fn update_inventory(
        &self,
        session: &Session,
        id: &InventoryItemId,
        update: &InventoryUpdate,
    ) -> Result<InventoryItem> {
        Self::require_admin(session)?;
        if update.quantity < Decimal::ZERO {
            return Err(ApiError::InvalidInput(
                "Quantity cannot be negative".to_string(),
            ));
        }
        let path = format!("admin/inventory/{}", segment(id.as_str()));
        self.send_json(Method::PUT, &path, update, Some(session))
            .await
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions, or an error if
    /// the API request fails.
    #[instrument(skip(self, session))]
    pub async fn list_expenses(&self, session: &Session) -> Result<Vec<Expense>> {
        Self::require_admin(session)?;
        Ok(self
            .get::<Listing<Expense>>("admin/expenses", Some(session))
            .await?
            .into_vec())
    }

    /// Record an expense.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions,
    /// `ApiError::InvalidInput` for a blank title or non-positive amount, or
    /// an error if the API request fails.
    #[instrument(skip(self, session, input), fields(amount = %input.amount))]
    pub async fn add_expense(&self, session: &Session, input: &ExpenseInput) -> Result<Expense> {
        Self::require_admin(session)?;
        if input.title.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "Expense title is required".to_string(),
            ));
        }
        if input.amount.amount() <= Decimal::ZERO {
            return Err(ApiError::InvalidInput(
                "Expense amount must be greater than zero".to_string(),
            ));
        }
        self.send_json(Method::POST, "admin/expenses", input, Some(session))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions, or an error if
    /// the API request fails.
    #[instrument(skip(self, session), fields(expense_id = %id))]
    pub async fn delete_expense(&self, session: &Session, id: &ExpenseId) -> Result<()> {
        Self::require_admin(session)?;
        let path = format!("admin/expenses/{}", segment(id.as_str()));
        self.send_unit::<()>(Method::DELETE, &path, None, Some(session))
            .await
    }

    // =========================================================================
    // Recipes
    // =========================================================================

    /// Publish a recipe. Ingredients and instructions are sent as plain lists.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions,
    /// `ApiError::InvalidInput` for a blank title, or an error if the API
    /// request fails.
    #[instrument(skip(self, session, input), fields(title = %input.title))]
    pub async fn create_recipe(&self, session: &Session, input: &RecipeInput) -> Result<Recipe> {
        Self::require_admin(session)?;
        check_recipe(input)?;
        self.send_json(Method::POST, "admin/recipes", input, Some(session))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions,
    /// `ApiError::InvalidInput` for a blank title, or an error if the API
    /// request fails.
    #[instrument(skip(self, session, input), fields(recipe_id = %id))]
    pub async fn update_recipe(
        &self,
        session: &Session,
        id: &RecipeId,
        input: &RecipeInput,
    ) -> Result<Recipe> {
        Self::require_admin(session)?;
        check_recipe(input)?;
        let path = format!("admin/recipes/{}", segment(id.as_str()));
        self.send_json(Method::PUT, &path, input, Some(session))
            .await
    }

    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` for non-admin sessions, or an error if
    /// the API request fails.
    #[instrument(skip(self, session), fields(recipe_id = %id))]
    pub async fn delete_recipe(&self, session: &Session, id: &RecipeId) -> Result<()> {
        Self::require_admin(session)?;
        let path = format!("admin/recipes/{}", segment(id.as_str()));
        self.send_unit::<()>(Method::DELETE, &path, None, Some(session))
            .await
    }
}
