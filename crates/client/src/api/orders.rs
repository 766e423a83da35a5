//! Order endpoints.
//!
//! These are the raw calls. [`OrderSubmission`](crate::orders::OrderSubmission)
//! wraps them to keep the draft and the recent-orders cache in step.

use hotmeal_core::OrderId;
use serde_json::Value;
use tracing::instrument;

use super::types::{Order, OrderUpdate};
use crate::draft::DraftOrder;
use crate::error::Result;
use crate::request::RequestClient;

/// Create an order from `draft`.
///
/// # Errors
///
/// Returns any request error.
#[instrument(skip(client, draft), fields(lines = draft.dish_list.len()))]
pub async fn create(client: &RequestClient, draft: &DraftOrder) -> Result<Order> {
    client.post("/orders/", draft).await
}

/// Orders placed by the logged-in account, newest first.
///
/// # Errors
///
/// Returns any request error.
#[instrument(skip(client))]
pub async fn mine(client: &RequestClient, include_items: bool) -> Result<Vec<Order>> {
    client
        .get("/orders/me", &[("include_items", include_items.to_string())])
        .await
}

/// Fetch one order with its items.
///
/// # Errors
///
/// Returns any request error.
#[instrument(skip(client))]
pub async fn get(client: &RequestClient, id: OrderId) -> Result<Order> {
    client.get(&format!("/orders/{id}"), &[]).await
}

/// Cancel a pending order. The backend echoes no order data.
///
/// # Errors
///
/// Returns any request error.
#[instrument(skip(client))]
pub async fn cancel(client: &RequestClient, id: OrderId) -> Result<()> {
    client
        .put::<Value, _>(&format!("/orders/{id}/cancel"), None)
        .await
}

/// Update state or payment details.
///
/// # Errors
///
/// Returns any request error.
#[instrument(skip(client, update))]
pub async fn update(client: &RequestClient, id: OrderId, update: &OrderUpdate) -> Result<Order> {
    client.put(&format!("/orders/{id}"), Some(update)).await
}
