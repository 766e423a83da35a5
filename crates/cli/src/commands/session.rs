//! Login, logout and navigation checks.

use hotmeal_client::api::auth;
use hotmeal_client::{ClientState, GuardDecision};
use secrecy::SecretString;

use crate::error::CliError;
use crate::output;

/// Log in and persist the session.
pub async fn login(
    state: &ClientState,
    account: &str,
    password: &SecretString,
) -> Result<(), CliError> {
    let user = auth::login(state.client(), account, password).await?;
    tracing::info!(user_id = %user.user_id, role = %user.role, "Logged in");
    output::line(&format!("Logged in as {} ({})", user.display_name(), user.role));
    Ok(())
}

/// Log out and purge the stored session.
pub fn logout(state: &ClientState) -> Result<(), CliError> {
    auth::logout(state.client())?;
    output::line("Logged out.");
    Ok(())
}

/// Show the account behind the stored session.
pub async fn whoami(state: &ClientState) -> Result<(), CliError> {
    if !state.session().is_logged_in() {
        output::line("Not logged in.");
        return Ok(());
    }
    let user = auth::profile(state.client()).await?;
    output::line(&format!(
        "{} <{}> {}",
        user.display_name(),
        user.account,
        user.role
    ));
    Ok(())
}

/// Show what the route guard decides for `path`.
pub fn route(state: &ClientState, path: &str) {
    match state.guard().check(path) {
        GuardDecision::Proceed => output::line(&format!("{path}: proceed")),
        GuardDecision::Redirect(to) => output::line(&format!("{path}: redirect to {to}")),
    }
}
