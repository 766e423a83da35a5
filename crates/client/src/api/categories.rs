//! Menu categories.

use tracing::instrument;

use super::types::Category;
use crate::error::Result;
use crate::request::RequestClient;

/// List all categories.
///
/// # Errors
///
/// Returns any request error.
#[instrument(skip(client))]
pub async fn list(client: &RequestClient) -> Result<Vec<Category>> {
    client.get("/categories/", &[]).await
}
