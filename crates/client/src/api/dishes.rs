//! Menu dishes.

use hotmeal_core::{CategoryId, DishId};
use tracing::instrument;

use super::types::Dish;
use crate::error::Result;
use crate::request::RequestClient;

/// List dishes, optionally restricted to one category.
///
/// # Errors
///
/// Returns any request error.
#[instrument(skip(client))]
pub async fn list(client: &RequestClient, category: Option<CategoryId>) -> Result<Vec<Dish>> {
    let query: Vec<(&str, String)> = category
        .map(|id| ("category_id", id.to_string()))
        .into_iter()
        .collect();
    client.get("/dishes/", &query).await
}

/// Fetch one dish.
///
/// # Errors
///
/// Returns any request error.
#[instrument(skip(client))]
pub async fn get(client: &RequestClient, id: DishId) -> Result<Dish> {
    client.get(&format!("/dishes/{id}"), &[]).await
}
