//! HotMeal client core.
//!
//! Shared by the staff/admin console and the customer ordering app:
//!
//! - **Request pipeline**: [`RequestClient`] attaches the bearer credential,
//!   classifies backend failures and drives session-expiry recovery.
//! - **Session**: [`SessionStore`], one per running client, persisted.
//! - **Navigation**: [`RouteGuard`] redirects by login state and role.
//! - **Cart and orders**: [`CartModel`], [`DraftOrderModel`] and
//!   [`OrderSubmission`], persisted through a [`StorageGateway`].
//!
//! Hosts supply a [`Notifier`] for transient notices and a [`Navigator`] for
//! redirects; [`ClientState`] wires everything together.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod draft;
pub mod error;
pub mod guard;
pub mod notice;
pub mod orders;
pub mod request;
pub mod session;
pub mod state;
pub mod storage;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use cart::{CartItem, CartLine, CartModel};
pub use config::{ClientConfig, ConfigError};
pub use draft::{DraftLine, DraftOrder, DraftOrderModel};
pub use error::{ClientError, Result};
pub use guard::{AccessState, ClientKind, GuardDecision, Navigator, Route, RouteGuard};
pub use notice::{LogNotifier, Notice, NoticeLevel, Notifier};
pub use orders::{OrderSubmission, RecentOrders};
pub use request::RequestClient;
pub use session::{SessionSnapshot, SessionStore};
pub use state::{ClientState, Collaborators, StateError};
pub use storage::{FileStorage, MemoryStorage, StorageError, StorageGateway};
pub use transport::{ReqwestTransport, Transport, TransportError};
