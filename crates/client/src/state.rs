//! Composition root.
//!
//! Builds the one [`SessionStore`] of a running client and shares it by
//! reference into the request client and the route guard. Models are owned
//! here and mutated through `&mut self`.

use std::sync::Arc;

use hotmeal_core::AreaId;
use url::Url;

use crate::api::types::Order;
use crate::cart::CartModel;
use crate::config::ClientConfig;
use crate::draft::DraftOrderModel;
use crate::error::Result;
use crate::guard::{Navigator, RouteGuard};
use crate::notice::Notifier;
use crate::orders::{OrderSubmission, RecentOrders};
use crate::request::RequestClient;
use crate::session::SessionStore;
use crate::storage::{FileStorage, StorageError, StorageGateway};
use crate::transport::{ReqwestTransport, Transport, TransportError};

/// Error assembling a client from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Host-supplied collaborators.
#[derive(Clone)]
pub struct Collaborators {
    pub storage: Arc<dyn StorageGateway>,
    pub transport: Arc<dyn Transport>,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
}

/// Everything a running client needs, wired together.
pub struct ClientState {
    session: Arc<SessionStore>,
    client: RequestClient,
    guard: RouteGuard,
    cart: CartModel,
    drafts: DraftOrderModel,
    orders: OrderSubmission,
}

impl std::fmt::Debug for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientState")
            .field("session", &self.session.snapshot())
            .field("cart_lines", &self.cart.lines().len())
            .finish_non_exhaustive()
    }
}

impl ClientState {
    /// Restore persisted state and wire the components together.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend root URL
    /// * `login_path` - Route unauthenticated users are sent to
    /// * `parts` - Storage, transport, notifier and navigator
    ///
    /// # Errors
    ///
    /// Returns an error if persisted state cannot be read.
    pub fn new(
        base_url: Url,
        login_path: &str,
        parts: Collaborators,
    ) -> std::result::Result<Self, StorageError> {
        let Collaborators {
            storage,
            transport,
            notifier,
            navigator,
        } = parts;

        let session = Arc::new(SessionStore::restore(storage.clone())?);
        let client = RequestClient::new(
            base_url,
            transport,
            session.clone(),
            notifier,
            navigator,
            login_path,
        );
        let guard = RouteGuard::new(session.clone(), login_path);
        let cart = CartModel::restore(storage.clone())?;
        let drafts = DraftOrderModel::restore(storage.clone())?;
        let orders = OrderSubmission::new(client.clone(), RecentOrders::restore(storage)?);

        tracing::debug!(
            logged_in = session.is_logged_in(),
            cart_lines = cart.lines().len(),
            "Client state restored"
        );

        Ok(Self {
            session,
            client,
            guard,
            cart,
            drafts,
            orders,
        })
    }

    /// Build a client from configuration with file-backed storage and the
    /// `reqwest` transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory or HTTP client cannot be set up.
    pub fn from_config(
        config: &ClientConfig,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> std::result::Result<Self, StateError> {
        let storage = Arc::new(FileStorage::open(&config.state_dir)?);
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        Ok(Self::new(
            config.api_base_url.clone(),
            config.login_path(),
            Collaborators {
                storage,
                transport,
                notifier,
                navigator,
            },
        )?)
    }

    #[must_use]
    pub const fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    #[must_use]
    pub const fn client(&self) -> &RequestClient {
        &self.client
    }

    #[must_use]
    pub const fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    #[must_use]
    pub const fn cart(&self) -> &CartModel {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut CartModel {
        &mut self.cart
    }

    #[must_use]
    pub const fn drafts(&self) -> &DraftOrderModel {
        &self.drafts
    }

    pub fn drafts_mut(&mut self) -> &mut DraftOrderModel {
        &mut self.drafts
    }

    #[must_use]
    pub const fn orders(&self) -> &OrderSubmission {
        &self.orders
    }

    pub fn orders_mut(&mut self) -> &mut OrderSubmission {
        &mut self.orders
    }

    /// Copy the cart into the draft for `area_id`. The cart is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft cannot be persisted.
    pub fn checkout(&mut self, area_id: Option<AreaId>) -> std::result::Result<(), StorageError> {
        self.drafts.set_draft(self.cart.to_draft_lines(), area_id)
    }

    /// Submit the current draft.
    ///
    /// # Errors
    ///
    /// As [`OrderSubmission::submit`].
    pub async fn submit(&mut self) -> Result<Order> {
        self.orders.submit(&mut self.drafts).await
    }
}
