//! Integration tests for the Cake Shop client.
//!
//! [`MockBackend`] serves the backend's REST routes from memory on an
//! ephemeral local port. Tests drive a real [`ApiClient`] against it and then
//! inspect what the backend received.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cake-shop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Login, two-factor verification, refresh, logout
//! - `cards` - Card validation before submission and card management
//! - `shopping` - Catalog cache, cart, checkout, addresses, notifications
//! - `admin` - Role checks, calendar markings, inventory, expenses, recipes
//! - `errors` - Server messages and fallbacks

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use cake_shop_client::{ApiClient, ClientConfig, LoginOutcome, Session};
use cake_shop_core::Email;
use secrecy::SecretString;
use serde_json::{Map, Value, json};

/// Customer account without two-factor.
pub const USER_EMAIL: &str = "jane@example.com";
/// Admin account.
pub const ADMIN_EMAIL: &str = "admin@example.com";
/// Customer account with two-factor enabled.
pub const TWO_FACTOR_EMAIL: &str = "twofa@example.com";
/// Already registered; registration with it fails.
pub const TAKEN_EMAIL: &str = "taken@example.com";
/// Password of every seeded account.
pub const PASSWORD: &str = "correct-horse";
/// The one-time code the backend accepts.
pub const TWO_FACTOR_CODE: &str = "123456";
/// Looking up this cake fails with a bare 500.
pub const BROKEN_CAKE_ID: &str = "c-broken";

/// One request as the backend received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    /// Path below `/api`, e.g. `/cakes`.
    pub path: String,
    pub has_bearer: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Caller {
    Customer,
    Admin,
}

#[derive(Default)]
struct MockState {
    requests: Vec<RecordedRequest>,
    revoked: Vec<String>,
    codes_sent: usize,
    next_id: u32,
    cakes: Vec<Value>,
    cart: Vec<Value>,
    orders: Vec<Value>,
    all_orders: Vec<Value>,
    cards: Vec<Value>,
    card_bodies: Vec<Value>,
    addresses: Vec<Value>,
    notifications: Vec<Value>,
    users: Vec<Value>,
    inventory: Vec<Value>,
    expenses: Vec<Value>,
    recipes: Vec<Value>,
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockState {
    fn seeded() -> Self {
        Self {
            cakes: vec![
                json!({"_id": "c1", "name": "Chocolate Fudge", "description": "Rich dark chocolate layers",
                       "price": 32.5, "category": "Chocolate", "stock": 4}),
                json!({"_id": "c2", "name": "Lemon Drizzle", "description": "Zesty sponge with lemon glaze",
                       "price": 24, "category": "Classic", "stock": 0}),
                json!({"_id": "c3", "name": "Red Velvet", "description": "Cream cheese frosting",
                       "price": 28.75, "category": "Classic"}),
            ],
            orders: vec![
                json!({"_id": "o1", "user": "u1", "status": "delivered", "totalPrice": 32.5,
                       "createdAt": "2025-06-01T10:00:00.000Z", "deliveryDate": "2025-06-03T10:00:00.000Z",
                       "items": [{"cake": "c1", "quantity": 1, "price": 32.5}]}),
                json!({"_id": "o2", "user": "u1", "status": "pending", "totalPrice": 24,
                       "createdAt": "2025-06-18T09:30:00.000Z", "items": []}),
            ],
            all_orders: vec![
                json!({"_id": "o1", "status": "delivered", "totalPrice": 32.5,
                       "createdAt": "2025-06-01T10:00:00Z", "deliveryDate": "2025-06-03T10:00:00Z"}),
                json!({"_id": "o2", "status": "pending", "totalPrice": 24,
                       "createdAt": "2025-06-18T09:30:00Z"}),
                json!({"_id": "o3", "status": "pending", "totalPrice": 40,
                       "createdAt": "2025-06-10T08:00:00Z", "deliveryDate": "2025-06-20T12:00:00Z"}),
                json!({"_id": "o4", "status": "Confirmed", "totalPrice": 55,
                       "createdAt": "2025-06-11T08:00:00Z", "deliveryDate": "2025-06-20T18:00:00Z"}),
                json!({"_id": "o5", "status": "confirmed", "totalPrice": 15,
                       "createdAt": "2025-06-12T08:00:00Z"}),
                json!({"_id": "o6", "status": "pending", "totalPrice": 18,
                       "createdAt": "2025-06-13T08:00:00Z", "deliveryDate": "not a date"}),
                json!({"_id": "o7", "status": "cancelled", "totalPrice": 60,
                       "createdAt": "2025-06-14T08:00:00Z", "deliveryDate": "2025-06-20"}),
            ],
            cards: vec![json!({"id": "card1", "cardNumber": "5500000000000004",
                               "cardHolderName": "Jane Baker", "expiryDate": "08/27",
                               "cardType": "mastercard", "isDefault": true})],
            notifications: vec![
                json!({"_id": "n1", "title": "Order confirmed", "message": "Your order o2 is confirmed",
                       "isRead": false, "type": "order", "createdAt": "2025-06-18T10:00:00Z"}),
                json!({"_id": "n2", "title": "Welcome", "message": "Thanks for joining",
                       "isRead": true, "type": "system", "createdAt": "2025-06-01T10:00:00Z"}),
                json!({"_id": "n3", "title": "New recipe", "message": "Try the lemon glaze",
                       "isRead": false, "createdAt": "2025-06-15T10:00:00Z"}),
            ],
            users: vec![
                json!({"_id": "u1", "name": "Jane Baker", "email": USER_EMAIL, "role": "user"}),
                json!({"_id": "a1", "name": "Head Baker", "email": ADMIN_EMAIL, "role": "admin"}),
            ],
            inventory: vec![
                json!({"_id": "i1", "name": "Flour", "quantity": 12.5, "unit": "kg", "lowStockThreshold": 5}),
                json!({"_id": "i2", "name": "Eggs", "quantity": 3, "unit": "dozen"}),
            ],
            expenses: vec![json!({"_id": "e1", "title": "Butter", "amount": 45.2,
                                  "category": "Ingredients", "date": "2025-06-01"})],
            recipes: vec![
                json!({"_id": "r1", "title": "Victoria Sponge",
                       "ingredients": [{"name": "flour", "quantity": "2", "unit": "cups"}, "4 eggs"],
                       "instructions": {"2": "Bake for 25 minutes", "1": {"step": "Cream butter and sugar"}}}),
                json!({"_id": "r2", "name": "Lemon Glaze",
                       "ingredients": {"items": ["1 lemon", "200g icing sugar"]},
                       "steps": "Zest the lemon\nWhisk with the sugar"}),
            ],
            ..Self::default()
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

// ============================================================================
// Response helpers
// ============================================================================

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn ok(value: Value) -> Response {
    Json(value).into_response()
}

fn created(value: Value) -> Response {
    (StatusCode::CREATED, Json(value)).into_response()
}

fn id_of(value: &Value) -> Option<&str> {
    value
        .get("_id")
        .or_else(|| value.get("id"))
        .and_then(Value::as_str)
}

fn find_mut<'a>(items: &'a mut [Value], id: &str) -> Option<&'a mut Value> {
    items.iter_mut().find(|item| id_of(item) == Some(id))
}

fn remove_by_id(items: &mut Vec<Value>, id: &str) -> bool {
    let before = items.len();
    items.retain(|item| id_of(item) != Some(id));
    items.len() != before
}

/// Copy every field of `patch` onto `target`.
fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

fn with_id(id: &str, body: &Value) -> Value {
    let mut object = Map::new();
    object.insert("_id".to_string(), json!(id));
    let mut value = Value::Object(object);
    merge(&mut value, body);
    value
}

fn caller(state: &Shared, headers: &HeaderMap) -> Result<Caller, Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match token {
        Some(token)
            if token.starts_with("access-") && !lock(state).revoked.iter().any(|r| r == token) =>
        {
            Ok(if token.starts_with("access-admin") {
                Caller::Admin
            } else {
                Caller::Customer
            })
        }
        _ => Err(message(StatusCode::UNAUTHORIZED, "Invalid or expired token")),
    }
}

fn admin(state: &Shared, headers: &HeaderMap) -> Result<(), Response> {
    match caller(state, headers)? {
        Caller::Admin => Ok(()),
        Caller::Customer => Err(message(StatusCode::FORBIDDEN, "Admin access required")),
    }
}

macro_rules! guard {
    ($check:expr) => {
        if let Err(response) = $check {
            return response;
        }
    };
}

// ============================================================================
// Auth
// ============================================================================

fn tokens(access: &str, refresh: &str, user_id: &str, role: &str) -> Value {
    json!({
        "accessToken": access,
        "refreshToken": refresh,
        "user": {"_id": user_id, "role": role}
    })
}

async fn register(Json(body): Json<Value>) -> Response {
    if body.get("email").and_then(Value::as_str) == Some(TAKEN_EMAIL) {
        return message(StatusCode::CONFLICT, "Email already registered");
    }
    created(json!({"message": "Registered"}))
}

async fn login(Json(body): Json<Value>) -> Response {
    if body.get("password").and_then(Value::as_str) != Some(PASSWORD) {
        return message(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    match body.get("email").and_then(Value::as_str) {
        Some(USER_EMAIL) => ok(tokens("access-user", "refresh-user", "u1", "user")),
        Some(ADMIN_EMAIL) => ok(tokens("access-admin", "refresh-admin", "a1", "admin")),
        Some(TWO_FACTOR_EMAIL) => ok(json!({
            "requiresTwoFactor": true,
            "userId": "u-2fa",
            "message": "Enter the code we sent to your email"
        })),
        _ => message(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    }
}

async fn send_two_factor(State(state): State<Shared>) -> Response {
    lock(&state).codes_sent += 1;
    ok(json!({"message": "Code sent"}))
}

async fn verify_two_factor(Json(body): Json<Value>) -> Response {
    if body.get("code").and_then(Value::as_str) != Some(TWO_FACTOR_CODE) {
        return message(StatusCode::BAD_REQUEST, "Invalid verification code");
    }
    let user_id = body.get("userId").and_then(Value::as_str).unwrap_or("u-2fa");
    ok(tokens("access-2fa", "refresh-2fa", user_id, "user"))
}

async fn refresh(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let token = body
        .get("refreshToken")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let revoked = lock(&state).revoked.iter().any(|r| r == token);
    match token.strip_prefix("refresh-") {
        Some(rest) if !revoked => ok(json!({"accessToken": format!("access-{rest}-renewed")})),
        _ => message(StatusCode::UNAUTHORIZED, "Refresh token expired"),
    }
}

fn revoke_bearer(state: &Shared, headers: &HeaderMap) {
    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        lock(state).revoked.push(token.to_string());
    }
}

async fn logout(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    guard!(caller(&state, &headers));
    revoke_bearer(&state, &headers);
    if let Some(token) = body.get("refreshToken").and_then(Value::as_str) {
        lock(&state).revoked.push(token.to_string());
    }
    ok(json!({"message": "Logged out"}))
}

async fn delete_account(State(state): State<Shared>, headers: HeaderMap) -> Response {
    guard!(caller(&state, &headers));
    revoke_bearer(&state, &headers);
    ok(json!({"message": "Account deleted"}))
}

// ============================================================================
// Catalog, cart and orders
// ============================================================================

async fn list_cakes(State(state): State<Shared>) -> Response {
    ok(Value::Array(lock(&state).cakes.clone()))
}

async fn get_cake(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    if id == BROKEN_CAKE_ID {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let mut state = lock(&state);
    match find_mut(&mut state.cakes, &id) {
        Some(cake) => ok(cake.clone()),
        None => message(StatusCode::NOT_FOUND, "Cake not found"),
    }
}

fn cart_body(state: &MockState) -> Value {
    json!({ "items": state.cart })
}

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    guard!(caller(&state, &headers));
    ok(cart_body(&lock(&state)))
}

async fn add_to_cart(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    guard!(caller(&state, &headers));
    let cake_id = body.get("cakeId").and_then(Value::as_str).unwrap_or_default();
    let quantity = body.get("quantity").and_then(Value::as_u64).unwrap_or(1);

    let mut state = lock(&state);
    let Some(cake) = find_mut(&mut state.cakes, cake_id).cloned() else {
        return message(StatusCode::NOT_FOUND, "Cake not found");
    };
    if cake.get("stock").and_then(Value::as_u64) == Some(0) {
        let name = cake.get("name").and_then(Value::as_str).unwrap_or("Cake");
        return message(StatusCode::BAD_REQUEST, &format!("{name} is out of stock"));
    }

    let existing = state
        .cart
        .iter()
        .position(|line| line.get("cake").and_then(Value::as_str) == Some(cake_id));
    if let Some(line) = existing.and_then(|index| state.cart.get_mut(index)) {
        let current = line.get("quantity").and_then(Value::as_u64).unwrap_or(0);
        line["quantity"] = json!(current + quantity);
    } else {
        let id = state.next_id("ci");
        state.cart.push(json!({
            "_id": id,
            "cake": cake_id,
            "name": cake["name"],
            "price": cake["price"],
            "quantity": quantity
        }));
    }
    ok(cart_body(&state))
}

async fn update_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    guard!(caller(&state, &headers));
    let mut state = lock(&state);
    let Some(line) = find_mut(&mut state.cart, &id) else {
        return message(StatusCode::NOT_FOUND, "Cart item not found");
    };
    line["quantity"] = body.get("quantity").cloned().unwrap_or(json!(1));
    ok(cart_body(&state))
}

async fn remove_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    guard!(caller(&state, &headers));
    let mut state = lock(&state);
    if !remove_by_id(&mut state.cart, &id) {
        return message(StatusCode::NOT_FOUND, "Cart item not found");
    }
    ok(cart_body(&state))
}

async fn clear_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    guard!(caller(&state, &headers));
    lock(&state).cart.clear();
    ok(json!({"message": "Cart cleared"}))
}

async fn place_order(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    guard!(caller(&state, &headers));
    let mut state = lock(&state);
    if state.cart.is_empty() {
        return message(StatusCode::BAD_REQUEST, "Your cart is empty");
    }

    let total: f64 = state
        .cart
        .iter()
        .map(|line| {
            let price = line.get("price").and_then(Value::as_f64).unwrap_or(0.0);
            let quantity = line.get("quantity").and_then(Value::as_f64).unwrap_or(0.0);
            price * quantity
        })
        .sum();
    let items: Vec<Value> = state
        .cart
        .iter()
        .map(|line| json!({"cake": line["cake"], "quantity": line["quantity"], "price": line["price"]}))
        .collect();
    let id = state.next_id("o");
    let order = json!({
        "_id": id,
        "user": "u1",
        "status": "pending",
        "totalPrice": total,
        "createdAt": "2025-06-19T12:00:00.000Z",
        "deliveryDate": body.get("deliveryDate"),
        "notes": body.get("notes"),
        "items": items
    });
    state.orders.push(order.clone());
    state.cart.clear();
    created(order)
}

async fn my_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    guard!(caller(&state, &headers));
    ok(json!({ "data": lock(&state).orders }))
}

async fn cancel_order(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    guard!(caller(&state, &headers));
    let mut state = lock(&state);
    let Some(order) = find_mut(&mut state.orders, &id) else {
        return message(StatusCode::NOT_FOUND, "Order not found");
    };
    order["status"] = json!("cancelled");
    ok(order.clone())
}

// ============================================================================
// Cards, addresses, notifications, recipes
// ============================================================================

async fn list_cards(State(state): State<Shared>, headers: HeaderMap) -> Response {
    guard!(caller(&state, &headers));
    ok(Value::Array(lock(&state).cards.clone()))
}

fn card_type(number: &str) -> &'static str {
    if number.starts_with('4') { "visa" } else { "mastercard" }
}

fn clear_default_cards(cards: &mut [Value]) {
    for card in cards {
        card["isDefault"] = json!(false);
    }
}

async fn add_card(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    guard!(caller(&state, &headers));
    let mut state = lock(&state);
    state.card_bodies.push(body.clone());

    let number = body.get("cardNumber").and_then(Value::as_str).unwrap_or_default();
    let id = state.next_id("card");
    let mut card = body.clone();
    merge(&mut card, &json!({"id": id, "cardType": card_type(number)}));
    if body.get("isDefault").and_then(Value::as_bool) == Some(true) {
        clear_default_cards(&mut state.cards);
    }
    state.cards.push(card.clone());
    created(json!({"message": "Card added", "card": card}))
}

async fn update_card(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    guard!(caller(&state, &headers));
    let mut state = lock(&state);
    state.card_bodies.push(body.clone());
    let Some(card) = find_mut(&mut state.cards, &id) else {
        return message(StatusCode::NOT_FOUND, "Card not found");
    };
    merge(card, &body);
    ok(json!({"message": "Card updated"}))
}

async fn delete_card(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    guard!(caller(&state, &headers));
    if remove_by_id(&mut lock(&state).cards, &id) {
        ok(json!({"message": "Card deleted"}))
    } else {
        message(StatusCode::NOT_FOUND, "Card not found")
    }
}

async fn set_default_card(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    guard!(caller(&state, &headers));
    let mut state = lock(&state);
    if find_mut(&mut state.cards, &id).is_none() {
        return message(StatusCode::NOT_FOUND, "Card not found");
    }
    clear_default_cards(&mut state.cards);
    if let Some(card) = find_mut(&mut state.cards, &id) {
        card["isDefault"] = json!(true);
    }
    ok(json!({"message": "Default card updated"}))
}

async fn list_addresses(State(state): State<Shared>, headers: HeaderMap) -> Response {
    guard!(caller(&state, &headers));
    ok(Value::Array(lock(&state).addresses.clone()))
}

async fn add_address(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    guard!(caller(&state, &headers));
    let mut state = lock(&state);
    let id = state.next_id("addr");
    let address = with_id(&id, &body);
    state.addresses.push(address.clone());
    created(address)
}

async fn update_address(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    guard!(caller(&state, &headers));
    let mut state = lock(&state);
    match find_mut(&mut state.addresses, &id) {
        Some(address) => {
            merge(address, &body);
            ok(address.clone())
        }
        None => message(StatusCode::NOT_FOUND, "Address not found"),
    }
}

async fn delete_address(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    guard!(caller(&state, &headers));
    if remove_by_id(&mut lock(&state).addresses, &id) {
        ok(json!({"message": "Address deleted"}))
    } else {
        message(StatusCode::NOT_FOUND, "Address not found")
    }
}

async fn list_notifications(State(state): State<Shared>, headers: HeaderMap) -> Response {
    guard!(caller(&state, &headers));
    ok(Value::Array(lock(&state).notifications.clone()))
}

async fn mark_notification_read(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    guard!(caller(&state, &headers));
    let mut state = lock(&state);
    match find_mut(&mut state.notifications, &id) {
        Some(notification) => {
            notification["isRead"] = json!(true);
            ok(json!({"message": "Marked as read"}))
        }
        None => message(StatusCode::NOT_FOUND, "Notification not found"),
    }
}

async fn mark_all_read(State(state): State<Shared>, headers: HeaderMap) -> Response {
    guard!(caller(&state, &headers));
    for notification in &mut lock(&state).notifications {
        notification["isRead"] = json!(true);
    }
    ok(json!({"message": "All marked as read"}))
}

async fn list_recipes(State(state): State<Shared>) -> Response {
    ok(Value::Array(lock(&state).recipes.clone()))
}

async fn get_recipe(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = lock(&state);
    match find_mut(&mut state.recipes, &id) {
        Some(recipe) => ok(recipe.clone()),
        None => message(StatusCode::NOT_FOUND, "Recipe not found"),
    }
}

// ============================================================================
// Admin
// ============================================================================

async fn admin_list_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    guard!(admin(&state, &headers));
    ok(Value::Array(lock(&state).users.clone()))
}

async fn admin_delete_user(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    guard!(admin(&state, &headers));
    if remove_by_id(&mut lock(&state).users, &id) {
        ok(json!({"message": "User deleted"}))
    } else {
        message(StatusCode::NOT_FOUND, "User not found")
    }
}

async fn admin_update_role(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    guard!(admin(&state, &headers));
    let mut state = lock(&state);
    match find_mut(&mut state.users, &id) {
        Some(user) => {
            merge(user, &body);
            ok(user.clone())
        }
        None => message(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn admin_list_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    guard!(admin(&state, &headers));
    ok(Value::Array(lock(&state).all_orders.clone()))
}

async fn admin_update_order_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    guard!(admin(&state, &headers));
    let mut state = lock(&state);
    match find_mut(&mut state.all_orders, &id) {
        Some(order) => {
            order["status"] = body.get("status").cloned().unwrap_or(Value::Null);
            ok(order.clone())
        }
        None => message(StatusCode::NOT_FOUND, "Order not found"),
    }
}

async fn admin_list_inventory(State(state): State<Shared>, headers: HeaderMap) -> Response {
    guard!(admin(&state, &headers));
    ok(Value::Array(lock(&state).inventory.clone()))
}

async fn admin_update_inventory(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    guard!(admin(&state, &headers));
    let mut state = lock(&state);
    match find_mut(&mut state.inventory, &id) {
        Some(item) => {
            merge(item, &body);
            ok(item.clone())
        }
        None => message(StatusCode::NOT_FOUND, "Item not found"),
    }
}

async fn admin_list_expenses(State(state): State<Shared>, headers: HeaderMap) -> Response {
    guard!(admin(&state, &headers));
    ok(json!({ "items": lock(&state).expenses }))
}

async fn admin_add_expense(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    guard!(admin(&state, &headers));
    let mut state = lock(&state);
    let id = state.next_id("e");
    let expense = with_id(&id, &body);
    state.expenses.push(expense.clone());
    created(expense)
}

async fn admin_delete_expense(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    guard!(admin(&state, &headers));
    if remove_by_id(&mut lock(&state).expenses, &id) {
        ok(json!({"message": "Expense deleted"}))
    } else {
        message(StatusCode::NOT_FOUND, "Expense not found")
    }
}

async fn admin_create_recipe(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    guard!(admin(&state, &headers));
    let mut state = lock(&state);
    let id = state.next_id("r");
    let recipe = with_id(&id, &body);
    state.recipes.push(recipe.clone());
    created(recipe)
}

async fn admin_update_recipe(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    guard!(admin(&state, &headers));
    let mut state = lock(&state);
    match find_mut(&mut state.recipes, &id) {
        Some(recipe) => {
            merge(recipe, &body);
            ok(recipe.clone())
        }
        None => message(StatusCode::NOT_FOUND, "Recipe not found"),
    }
}

async fn admin_delete_recipe(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    guard!(admin(&state, &headers));
    if remove_by_id(&mut lock(&state).recipes, &id) {
        ok(json!({"message": "Recipe deleted"}))
    } else {
        message(StatusCode::NOT_FOUND, "Recipe not found")
    }
}

// ============================================================================
// Server
// ============================================================================

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    let entry = RecordedRequest {
        method: request.method().to_string(),
        path: path.strip_prefix("/api").unwrap_or(path).to_string(),
        has_bearer: request.headers().contains_key(AUTHORIZATION),
    };
    lock(&state).requests.push(entry);
    next.run(request).await
}

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/send-2fa", post(send_two_factor))
        .route("/auth/verify-2fa", post(verify_two_factor))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/account", delete(delete_account))
        .route("/cakes", get(list_cakes))
        .route("/cakes/{id}", get(get_cake))
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_to_cart))
        .route("/cart/items/{id}", put(update_cart_item).delete(remove_cart_item))
        .route("/orders", post(place_order))
        .route("/orders/my-orders", get(my_orders))
        .route("/orders/{id}/cancel", put(cancel_order))
        .route("/credit-cards", get(list_cards).post(add_card))
        .route("/credit-cards/{id}", put(update_card).delete(delete_card))
        .route("/credit-cards/{id}/default", put(set_default_card))
        .route("/addresses", get(list_addresses).post(add_address))
        .route("/addresses/{id}", put(update_address).delete(delete_address))
        .route("/notifications", get(list_notifications))
        .route("/notifications/read-all", put(mark_all_read))
        .route("/notifications/{id}/read", put(mark_notification_read))
        .route("/recipes", get(list_recipes))
        .route("/recipes/{id}", get(get_recipe))
        .route("/admin/users", get(admin_list_users))
        .route("/admin/users/{id}", delete(admin_delete_user))
        .route("/admin/users/{id}/role", put(admin_update_role))
        .route("/admin/orders", get(admin_list_orders))
        .route("/admin/orders/{id}/status", put(admin_update_order_status))
        .route("/admin/inventory", get(admin_list_inventory))
        .route("/admin/inventory/{id}", put(admin_update_inventory))
        .route("/admin/expenses", get(admin_list_expenses).post(admin_add_expense))
        .route("/admin/expenses/{id}", delete(admin_delete_expense))
        .route("/admin/recipes", post(admin_create_recipe))
        .route("/admin/recipes/{id}", put(admin_update_recipe).delete(admin_delete_recipe));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

/// In-memory backend listening on `127.0.0.1` for the lifetime of the value.
pub struct MockBackend {
    base_url: String,
    state: Shared,
    server: tokio::task::JoinHandle<()>,
}

impl MockBackend {
    /// Start a backend with the seeded fixtures.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::seeded()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener
            .local_addr()
            .expect("Failed to read mock backend address");

        let app = router(state.clone());
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock backend stopped");
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
            server,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A client pointed at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        let config = ClientConfig::with_api_url(&self.base_url).expect("Invalid mock backend URL");
        ApiClient::new(&config).expect("Failed to build client")
    }

    /// Log in with a seeded account that has no two-factor step.
    ///
    /// # Panics
    ///
    /// Panics if the login fails or asks for two-factor verification.
    pub async fn login(&self, client: &ApiClient, email: &str) -> Session {
        let email = Email::parse(email).expect("Invalid email");
        let outcome = client
            .login(&email, &SecretString::from(PASSWORD))
            .await
            .expect("Login failed");
        match outcome {
            LoginOutcome::Authenticated(session) => session,
            LoginOutcome::TwoFactorRequired { .. } => panic!("Unexpected two-factor prompt"),
        }
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// Number of requests with this method and path (below `/api`).
    #[must_use]
    pub fn count(&self, method: &str, path: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Number of requests whose path starts with `prefix`.
    #[must_use]
    pub fn count_prefix(&self, prefix: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .count()
    }

    /// Raw bodies of card create/update requests.
    #[must_use]
    pub fn card_bodies(&self) -> Vec<Value> {
        lock(&self.state).card_bodies.clone()
    }

    /// How many two-factor codes were requested.
    #[must_use]
    pub fn codes_sent(&self) -> usize {
        lock(&self.state).codes_sent
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}
