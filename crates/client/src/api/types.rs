//! Backend payload types.
//!
//! Field names follow the backend's JSON exactly. Monetary fields arrive as
//! decimal strings and are parsed into [`Price`]; timestamps are RFC 3339.

use chrono::{DateTime, Utc};
use hotmeal_core::{
    AccountStatus, AreaId, AreaState, AreaType, CategoryId, DishId, OrderId, OrderItemId,
    OrderState, PaymentMethod, Price, Role, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;

const fn default_true() -> bool {
    true
}

// =============================================================================
// Menu
// =============================================================================

/// A dish on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub dish_id: DishId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sales: i32,
    #[serde(default)]
    pub rating: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Dish {
    /// Whether the dish can be ordered right now.
    #[must_use]
    pub const fn is_orderable(&self) -> bool {
        self.is_available && self.stock > 0
    }
}

impl From<&Dish> for CartItem {
    fn from(dish: &Dish) -> Self {
        Self {
            item_id: dish.dish_id,
            name: dish.name.clone(),
            unit_price: dish.price,
            image_ref: dish.image_url.clone(),
        }
    }
}

/// A menu category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub img_url: Option<String>,
    #[serde(default)]
    pub parent_category_id: Option<CategoryId>,
}

/// A table, bar seat or private room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningArea {
    pub area_id: AreaId,
    pub area_name: String,
    pub state: AreaState,
    pub area_type: AreaType,
    #[serde(default)]
    pub max_capacity: Option<i32>,
    #[serde(default)]
    pub usage_count: i32,
    #[serde(default)]
    pub assigned_user_id: Option<UserId>,
    #[serde(default)]
    pub assigned_username: Option<String>,
}

// =============================================================================
// Orders
// =============================================================================

/// One line of a submitted order, priced at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_item_id: OrderItemId,
    pub dish_id: DishId,
    pub dish_name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub total: Price,
}

/// A submitted order as echoed by the backend.
///
/// Order endpoints nest the owner and dining area (`user: {user_id, ..}`,
/// `area: {area_id, area_name}`) and list lines under `items`. The flat
/// form (`user_id`, `area_id`, `order_items`) is what gets persisted and is
/// accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireOrder")]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: Option<UserId>,
    pub area_id: Option<AreaId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,
    pub state: OrderState,
    pub price: Price,
    pub payment_method: Option<PaymentMethod>,
    pub image_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub order_items: Vec<OrderItem>,
}

#[derive(Deserialize)]
struct UserRef {
    user_id: UserId,
}

#[derive(Deserialize)]
struct AreaRef {
    area_id: AreaId,
    #[serde(default)]
    area_name: Option<String>,
}

/// Either order shape, before the nested references are flattened.
#[derive(Deserialize)]
struct WireOrder {
    order_id: OrderId,
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    user: Option<UserRef>,
    #[serde(default)]
    area_id: Option<AreaId>,
    #[serde(default)]
    area_name: Option<String>,
    #[serde(default)]
    area: Option<AreaRef>,
    state: OrderState,
    price: Price,
    #[serde(default)]
    payment_method: Option<PaymentMethod>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "items")]
    order_items: Vec<OrderItem>,
}

impl From<WireOrder> for Order {
    fn from(wire: WireOrder) -> Self {
        let (area_id, area_name) = match wire.area {
            Some(area) => (Some(area.area_id), area.area_name),
            None => (wire.area_id, wire.area_name),
        };
        Self {
            order_id: wire.order_id,
            user_id: wire.user.map(|u| u.user_id).or(wire.user_id),
            area_id,
            area_name,
            state: wire.state,
            price: wire.price,
            payment_method: wire.payment_method,
            image_url: wire.image_url,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
            order_items: wire.order_items,
        }
    }
}

/// Staff-side changes to an order. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<OrderState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl OrderUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.payment_method.is_none() && self.image_url.is_none()
    }
}

// =============================================================================
// Accounts
// =============================================================================

/// An account as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub account: String,
    pub role: Role,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl User {
    /// Name to greet the user with: the display name, else the account.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.account)
    }
}

/// Successful login response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}
