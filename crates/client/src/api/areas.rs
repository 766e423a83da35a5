//! Dining areas.

use hotmeal_core::{AreaState, AreaType};
use tracing::instrument;

use super::types::DiningArea;
use crate::error::Result;
use crate::request::RequestClient;

/// List dining areas, optionally filtered by state and type.
///
/// # Errors
///
/// Returns any request error.
#[instrument(skip(client))]
pub async fn list(
    client: &RequestClient,
    state: Option<AreaState>,
    area_type: Option<AreaType>,
) -> Result<Vec<DiningArea>> {
    let mut query = Vec::new();
    if let Some(state) = state {
        query.push(("state", state.to_string()));
    }
    if let Some(area_type) = area_type {
        query.push(("area_type", area_type.to_string()));
    }
    client.get("/dining-areas/", &query).await
}
