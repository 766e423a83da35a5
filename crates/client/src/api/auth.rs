//! Login, logout and the current account.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;

use super::types::{AuthPayload, User};
use crate::error::{ClientError, Result};
use crate::notice::Notice;
use crate::request::RequestClient;

#[derive(Serialize)]
struct LoginRequest<'a> {
    account: &'a str,
    password: &'a str,
}

/// Exchange credentials for a token and log the session in.
///
/// # Errors
///
/// Returns `ClientError::Validation` without a network call if either field
/// is blank; otherwise any request error, or a storage error if the session
/// cannot be persisted.
#[instrument(skip(client, password))]
pub async fn login(client: &RequestClient, account: &str, password: &SecretString) -> Result<User> {
    let account = account.trim();
    if account.is_empty() || password.expose_secret().is_empty() {
        let message = "Account and password are required";
        client.notifier().notify(Notice::warning(message));
        return Err(ClientError::Validation(message.to_string()));
    }

    let payload: AuthPayload = client
        .post(
            "/auth/token",
            &LoginRequest {
                account,
                password: password.expose_secret(),
            },
        )
        .await?;

    let user = payload.user;
    client.session().login_as(
        user.display_name(),
        SecretString::from(payload.token),
        Some(user.role),
        Some(user.user_id),
    )?;
    Ok(user)
}

/// End the session and purge its snapshot. No network call.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be removed.
pub fn logout(client: &RequestClient) -> Result<()> {
    client.session().logout()?;
    Ok(())
}

/// The logged-in account.
///
/// # Errors
///
/// Returns any request error.
#[instrument(skip(client))]
pub async fn profile(client: &RequestClient) -> Result<User> {
    client.get("/users/me", &[]).await
}
