//! End-to-end tests for the HotMeal client.
//!
//! Each test spins up an axum router on an ephemeral port that speaks the
//! backend's envelope format, then drives a [`ClientState`] against it
//! through the real `reqwest` transport.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hotmeal-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hotmeal_client::testing::{RecordingNavigator, RecordingNotifier};
use hotmeal_client::{ClientState, Collaborators, ReqwestTransport, StorageGateway};
use serde_json::{Value, json};
use url::Url;

/// Login route used by every harness.
pub const LOGIN_PATH: &str = "/login";

/// Serve `router` on `127.0.0.1` and return its base URL.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn spawn_backend(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, router).await.expect("serve") });
    Url::parse(&format!("http://{addr}/api")).expect("base url")
}

/// A base URL nothing is listening on.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn dead_backend() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    Url::parse(&format!("http://{addr}/api")).expect("base url")
}

/// Success envelope around `data`.
pub fn ok(data: Value) -> Json<Value> {
    Json(json!({ "status": "success", "error_code": 0, "message": "OK", "data": data }))
}

/// Error envelope with `status` and `message`.
pub fn fail(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "status": "error", "error_code": status.as_u16(), "message": message })),
    )
        .into_response()
}

/// Value of the `Authorization` header, if any.
pub fn bearer(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// A fresh scratch directory under the system temp dir.
pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("hotmeal-it-{}", uuid::Uuid::new_v4()))
}

/// A client wired to a stub backend with recording hosts.
pub struct Harness {
    pub state: ClientState,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    /// Build a client for `base_url` over `storage` with the given timeout.
    ///
    /// # Panics
    ///
    /// Panics if the transport or persisted state cannot be set up.
    pub fn new(base_url: Url, storage: Arc<dyn StorageGateway>, timeout: Duration) -> Self {
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let state = ClientState::new(
            base_url,
            LOGIN_PATH,
            Collaborators {
                storage,
                transport: Arc::new(ReqwestTransport::new(timeout).expect("transport")),
                notifier: notifier.clone(),
                navigator: navigator.clone(),
            },
        )
        .expect("client state");
        Self {
            state,
            notifier,
            navigator,
        }
    }
}
