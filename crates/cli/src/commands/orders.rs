//! Order submission and follow-up.

use hotmeal_client::ClientState;
use hotmeal_client::api::OrderUpdate;
use hotmeal_core::{OrderId, OrderState, PaymentMethod};

use crate::error::CliError;
use crate::output;

/// Submit the draft. The cart is emptied afterwards unless `keep_cart`.
pub async fn submit(state: &mut ClientState, keep_cart: bool) -> Result<(), CliError> {
    let order = state.submit().await?;
    if !keep_cart {
        state.cart_mut().clear()?;
    }
    output::line(&format!("Order #{} placed, total {}", order.order_id, order.price));
    Ok(())
}

pub async fn list(state: &mut ClientState, include_items: bool) -> Result<(), CliError> {
    let orders = state.orders_mut().list_mine(include_items).await?;
    output::orders(&orders);
    Ok(())
}

/// Cached orders, no network.
pub fn recent(state: &ClientState) {
    output::orders(state.orders().recent().orders());
}

pub async fn show(state: &mut ClientState, id: OrderId) -> Result<(), CliError> {
    let order = state.orders_mut().detail(id).await?;
    output::order(&order);
    Ok(())
}

pub async fn cancel(state: &mut ClientState, id: OrderId) -> Result<(), CliError> {
    state.orders_mut().cancel(id).await?;
    output::line(&format!("Order #{id} canceled."));
    Ok(())
}

/// Mark an order paid with `method`.
pub async fn pay(
    state: &mut ClientState,
    id: OrderId,
    method: PaymentMethod,
) -> Result<(), CliError> {
    let update = OrderUpdate {
        state: Some(OrderState::Paid),
        payment_method: Some(method),
        image_url: None,
    };
    let order = state.orders_mut().update(id, &update).await?;
    output::order(&order);
    Ok(())
}
