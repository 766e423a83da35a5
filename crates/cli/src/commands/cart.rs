//! Cart and draft order management.

use hotmeal_client::api::dishes;
use hotmeal_client::{CartItem, ClientState};
use hotmeal_core::{AreaId, DishId};

use crate::error::CliError;
use crate::output;

pub fn show(state: &ClientState) {
    output::cart(state.cart());
}

/// Look the dish up on the menu and add one unit.
pub async fn add(state: &mut ClientState, dish_id: DishId) -> Result<(), CliError> {
    let dish = dishes::get(state.client(), dish_id).await?;
    if !dish.is_orderable() {
        tracing::warn!(dish_id = %dish_id, "Dish is currently unavailable");
    }
    state.cart_mut().add_item(CartItem::from(&dish))?;
    output::line(&format!(
        "Added {} ({} in cart)",
        dish.name,
        state.cart().quantity_of(dish_id)
    ));
    Ok(())
}

pub fn increase(state: &mut ClientState, dish_id: DishId) -> Result<(), CliError> {
    if !state.cart_mut().increase(dish_id)? {
        return Err(not_in_cart(dish_id));
    }
    output::cart(state.cart());
    Ok(())
}

pub fn decrease(state: &mut ClientState, dish_id: DishId) -> Result<(), CliError> {
    if !state.cart_mut().decrease(dish_id)? {
        return Err(not_in_cart(dish_id));
    }
    output::cart(state.cart());
    Ok(())
}

pub fn remove(state: &mut ClientState, dish_id: DishId) -> Result<(), CliError> {
    if !state.cart_mut().remove(dish_id)? {
        return Err(not_in_cart(dish_id));
    }
    output::cart(state.cart());
    Ok(())
}

pub fn clear(state: &mut ClientState) -> Result<(), CliError> {
    state.cart_mut().clear()?;
    output::line("Cart cleared.");
    Ok(())
}

/// Replace the draft with the cart's contents.
pub fn checkout(state: &mut ClientState, area: Option<AreaId>) -> Result<(), CliError> {
    state.checkout(area)?;
    output::draft(state.drafts().draft());
    Ok(())
}

pub fn show_draft(state: &ClientState) {
    output::draft(state.drafts().draft());
}

pub fn clear_draft(state: &mut ClientState) -> Result<(), CliError> {
    state.drafts_mut().clear_draft()?;
    output::line("Draft discarded.");
    Ok(())
}

fn not_in_cart(dish_id: DishId) -> CliError {
    CliError::NotFound(format!("dish {dish_id} is not in the cart"))
}
