//! Menu browsing.

use hotmeal_client::ClientState;
use hotmeal_client::api;
use hotmeal_core::{AreaState, CategoryId};

use crate::error::CliError;
use crate::output;

pub async fn dishes(state: &ClientState, category: Option<CategoryId>) -> Result<(), CliError> {
    let list = api::dishes::list(state.client(), category).await?;
    output::dishes(&list);
    Ok(())
}

pub async fn categories(state: &ClientState) -> Result<(), CliError> {
    let list = api::categories::list(state.client()).await?;
    output::categories(&list);
    Ok(())
}

pub async fn areas(state: &ClientState, area_state: Option<AreaState>) -> Result<(), CliError> {
    let list = api::areas::list(state.client(), area_state, None).await?;
    output::areas(&list);
    Ok(())
}
