//! API payloads as exchanged with the Cake Shop backend.
//!
//! All models use the backend's camelCase field names and accept `_id` or `id`
//! for identifiers.

pub mod catalog;
pub mod inventory;
pub mod notification;
pub mod order;
pub mod user;

pub use catalog::{Cake, Cart, CartItem};
pub use inventory::{
    DEFAULT_LOW_STOCK_THRESHOLD, Expense, ExpenseInput, InventoryItem, InventoryUpdate,
    total_expenses,
};
pub use notification::{Notification, unread_count};
pub use order::{Order, OrderItem, PlaceOrder, parse_timestamp};
pub use user::{Address, AddressInput, User};
