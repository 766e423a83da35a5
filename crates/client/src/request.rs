//! Authenticated request pipeline.
//!
//! Every outbound call goes through [`RequestClient::send`], which attaches
//! the bearer credential, classifies the response, and drives session-expiry
//! recovery. No other component mutates the session in response to network
//! traffic.
//!
//! | Response              | Result                         | Side effects                        |
//! |-----------------------|--------------------------------|-------------------------------------|
//! | 2xx                   | payload                        | none                                |
//! | 401                   | [`ClientError::Auth`]          | teardown, notice, redirect to login |
//! | other 4xx             | [`ClientError::Business`]      | notice with server message          |
//! | 5xx / no response     | [`ClientError::Network`]       | notice                              |
//! | 2xx, unexpected shape | [`ClientError::Decode`]        | notice                              |

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::error::{
    ClientError, LOGIN_REQUIRED_MESSAGE, NETWORK_ERROR_MESSAGE, REQUEST_FAILED_MESSAGE, Result,
};
use crate::guard::Navigator;
use crate::notice::{Notice, Notifier};
use crate::session::SessionStore;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Backend response envelope: `{ status, error_code, message, data }`.
#[derive(Debug, serde::Deserialize)]
struct Envelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

/// Client for the HotMeal REST backend.
///
/// Cheap to clone; clones share the session, transport and collaborators.
#[derive(Clone)]
pub struct RequestClient {
    inner: Arc<RequestClientInner>,
}

struct RequestClientInner {
    base_url: Url,
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
}

impl std::fmt::Debug for RequestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("login_path", &self.inner.login_path)
            .finish_non_exhaustive()
    }
}

impl RequestClient {
    /// Create a client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend root; request paths are appended to it
    /// * `transport` - Sends the built requests
    /// * `session` - The client's single session
    /// * `notifier` - Receives one notice per failed request
    /// * `navigator` - Receives the login redirect on credential rejection
    /// * `login_path` - Route to redirect to on credential rejection
    #[must_use]
    pub fn new(
        base_url: Url,
        transport: Arc<dyn Transport>,
        session: Arc<SessionStore>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(RequestClientInner {
                base_url,
                transport,
                session,
                notifier,
                navigator,
                login_path: login_path.into(),
            }),
        }
    }

    /// The session this client reads credentials from.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    /// The notifier failures are reported to.
    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.inner.notifier
    }

    /// Backend root URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Send a request and return the raw JSON payload.
    ///
    /// An empty success body yields `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns the classified error; see the module table. Each network-path
    /// error has already been reported to the notifier when returned.
    #[instrument(
        skip(self, method, body, query),
        fields(method = %method, request_id = tracing::field::Empty, status = tracing::field::Empty)
    )]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, String)],
    ) -> Result<Value> {
        let url = self.build_url(path, query)?;
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let epoch = self.inner.session.epoch();
        let token = self.inner.session.token();
        let authenticated = token.is_some();

        let mut headers = vec![
            ("content-type".to_string(), "application/json".to_string()),
            (REQUEST_ID_HEADER.to_string(), request_id),
        ];
        if let Some(token) = token {
            headers.push((
                "authorization".to_string(),
                format!("Bearer {}", token.expose_secret()),
            ));
        }

        let request = HttpRequest {
            method,
            url,
            headers,
            body: body.cloned(),
        };

        let response = match self.inner.transport.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Request failed without response");
                self.notify_error(NETWORK_ERROR_MESSAGE);
                return Err(ClientError::Network(e.to_string()));
            }
        };
        tracing::Span::current().record("status", response.status);

        self.classify(response, epoch, authenticated)
    }

    /// `GET` and unwrap the envelope's `data`.
    ///
    /// # Errors
    ///
    /// As [`Self::send`], plus [`ClientError::Decode`] if `data` is not a `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let payload = self.send(Method::Get, path, None, query).await?;
        self.unwrap_envelope(payload)
    }

    /// `POST` a JSON body and unwrap the envelope's `data`.
    ///
    /// # Errors
    ///
    /// As [`Self::get`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode_body(body)?;
        let payload = self.send(Method::Post, path, Some(&body), &[]).await?;
        self.unwrap_envelope(payload)
    }

    /// `PUT` an optional JSON body and unwrap the envelope's `data`.
    ///
    /// # Errors
    ///
    /// As [`Self::get`].
    pub async fn put<B, T>(&self, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = body.map(encode_body).transpose()?;
        let payload = self.send(Method::Put, path, body.as_ref(), &[]).await?;
        self.unwrap_envelope(payload)
    }

    /// `DELETE` and unwrap the envelope's `data`.
    ///
    /// # Errors
    ///
    /// As [`Self::get`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let payload = self.send(Method::Delete, path, None, &[]).await?;
        self.unwrap_envelope(payload)
    }

    // =========================================================================
    // Classification
    // =========================================================================

    fn classify(&self, response: HttpResponse, epoch: u64, authenticated: bool) -> Result<Value> {
        let HttpResponse { status, body } = response;
        match status {
            200..=299 => {
                if body.trim().is_empty() {
                    return Ok(Value::Null);
                }
                serde_json::from_str(&body).map_err(|e| {
                    tracing::warn!(status, error = %e, "Success response is not JSON");
                    self.notify_error(REQUEST_FAILED_MESSAGE);
                    ClientError::Decode(e.to_string())
                })
            }
            401 => {
                self.handle_unauthorized(epoch, authenticated);
                Err(ClientError::Auth)
            }
            400..=499 => {
                let message =
                    server_message(&body).unwrap_or_else(|| REQUEST_FAILED_MESSAGE.to_string());
                tracing::warn!(status, message = %message, "Request rejected");
                self.notify_error(&message);
                Err(ClientError::Business { status, message })
            }
            _ => {
                tracing::warn!(status, "Server error");
                self.notify_error(NETWORK_ERROR_MESSAGE);
                Err(ClientError::Network(format!("HTTP {status}")))
            }
        }
    }

    /// Tear down the session once per epoch, then notify and redirect.
    ///
    /// A rejected anonymous request has no session to tear down; the first
    /// one of a batch still sends the user to the login route.
    fn handle_unauthorized(&self, epoch: u64, authenticated: bool) {
        if !self.inner.session.expire(epoch) {
            tracing::debug!(epoch, "Rejection already handled for this epoch");
            return;
        }
        tracing::warn!(epoch, authenticated, "Credential rejected, redirecting to login");
        self.inner
            .notifier
            .notify(Notice::warning(LOGIN_REQUIRED_MESSAGE));
        self.inner.navigator.navigate(&self.inner.login_path);
    }

    fn unwrap_envelope<T: DeserializeOwned>(&self, payload: Value) -> Result<T> {
        let data = if payload.is_null() {
            Value::Null
        } else {
            let envelope: Envelope =
                serde_json::from_value(payload).map_err(|e| self.decode_error(&e))?;
            if let Some(message) = envelope.message.as_deref() {
                tracing::trace!(message, "Envelope message");
            }
            envelope.data
        };
        serde_json::from_value(data).map_err(|e| self.decode_error(&e))
    }

    fn decode_error(&self, err: &serde_json::Error) -> ClientError {
        tracing::warn!(error = %err, "Response data has unexpected shape");
        self.notify_error(REQUEST_FAILED_MESSAGE);
        ClientError::Decode(err.to_string())
    }

    fn notify_error(&self, message: &str) {
        self.inner.notifier.notify(Notice::error(message));
    }

    fn build_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{base}/{path}"))
            .map_err(|e| ClientError::Validation(format!("invalid request path {path}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Value> {
    serde_json::to_value(body)
        .map_err(|e| ClientError::Validation(format!("unencodable request body: {e}")))
}

/// Non-empty `message` field of an error body, if present.
fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;
    use crate::storage::{MemoryStorage, keys};
    use crate::testing::{RecordingNavigator, RecordingNotifier, ScriptedTransport};
    use crate::transport::TransportError;

    struct Harness {
        client: RequestClient,
        transport: Arc<ScriptedTransport>,
        session: Arc<SessionStore>,
        storage: Arc<MemoryStorage>,
        notifier: Arc<RecordingNotifier>,
        navigator: Arc<RecordingNavigator>,
    }

    fn harness() -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let session = Arc::new(SessionStore::new(storage.clone()));
        let transport = Arc::new(ScriptedTransport::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let client = RequestClient::new(
            Url::parse("http://backend.test/api/").expect("url"),
            transport.clone(),
            session.clone(),
            notifier.clone(),
            navigator.clone(),
            "/login",
        );
        Harness {
            client,
            transport,
            session,
            storage,
            notifier,
            navigator,
        }
    }

    fn login(h: &Harness) {
        h.session
            .login("alice", SecretString::from("tok-1"))
            .expect("login");
    }

    #[tokio::test]
    async fn test_attaches_bearer_credential_when_present() {
        let h = harness();
        login(&h);
        h.transport.push_ok(json!([]));

        let _: Vec<Value> = h.client.get("/dishes/", &[]).await.expect("get");

        let sent = h.transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header("authorization"), Some("Bearer tok-1"));
        assert_eq!(sent[0].url.as_str(), "http://backend.test/api/dishes/");
        assert!(sent[0].header(REQUEST_ID_HEADER).is_some());
    }

    #[tokio::test]
    async fn test_missing_credential_is_not_an_error() {
        let h = harness();
        h.transport.push_ok(json!([]));

        let _: Vec<Value> = h.client.get("categories", &[]).await.expect("get");

        assert_eq!(h.transport.requests()[0].header("authorization"), None);
    }

    #[tokio::test]
    async fn test_query_pairs_are_encoded() {
        let h = harness();
        h.transport.push_ok(json!([]));

        let _: Vec<Value> = h
            .client
            .get("/dishes/", &[("category_id", "3".to_string())])
            .await
            .expect("get");

        assert_eq!(
            h.transport.requests()[0].url.as_str(),
            "http://backend.test/api/dishes/?category_id=3"
        );
    }

    #[tokio::test]
    async fn test_success_returns_payload_verbatim() {
        let h = harness();
        h.transport.push_json(201, &json!({"data": {"order_id": 5}}));

        let value = h
            .client
            .send(Method::Post, "/orders/", Some(&json!({})), &[])
            .await
            .expect("send");

        assert_eq!(value, json!({"data": {"order_id": 5}}));
        assert!(h.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let h = harness();
        h.transport.push_status(204, "");

        let value = h
            .client
            .send(Method::Delete, "/orders/1", None, &[])
            .await
            .expect("send");
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_unauthorized_tears_down_and_redirects() {
        let h = harness();
        login(&h);
        h.transport.push_error_envelope(401, "Token expired");

        let err = h
            .client
            .send(Method::Get, "/orders/me", None, &[])
            .await
            .expect_err("401");

        assert!(matches!(err, ClientError::Auth));
        assert!(!h.session.is_logged_in());
        assert!(!h.storage.contains(keys::SESSION));
        assert_eq!(h.notifier.messages(), vec![LOGIN_REQUIRED_MESSAGE.to_string()]);
        assert_eq!(h.navigator.visits(), vec!["/login".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_tear_down_once() {
        let h = harness();
        login(&h);
        h.transport.repeat_status(401, "");

        let (a, b, c) = tokio::join!(
            h.client.send(Method::Get, "/orders/me", None, &[]),
            h.client.send(Method::Get, "/users/me", None, &[]),
            h.client.send(Method::Get, "/dishes/", None, &[]),
        );

        assert!(matches!(a, Err(ClientError::Auth)));
        assert!(matches!(b, Err(ClientError::Auth)));
        assert!(matches!(c, Err(ClientError::Auth)));
        assert_eq!(h.transport.request_count(), 3);
        assert_eq!(h.navigator.visits().len(), 1);
        assert_eq!(h.notifier.notices().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_anonymous_unauthorized_redirects_once() {
        let h = harness();
        h.transport.repeat_status(401, "");

        let (a, b, c) = tokio::join!(
            h.client.send(Method::Get, "/orders/me", None, &[]),
            h.client.send(Method::Get, "/users/me", None, &[]),
            h.client.send(Method::Get, "/dishes/", None, &[]),
        );

        assert!(matches!(a, Err(ClientError::Auth)));
        assert!(matches!(b, Err(ClientError::Auth)));
        assert!(matches!(c, Err(ClientError::Auth)));
        assert_eq!(h.navigator.visits(), vec!["/login".to_string()]);
        assert_eq!(h.notifier.messages(), vec![LOGIN_REQUIRED_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn test_sequential_anonymous_unauthorized_redirects_each_time() {
        let h = harness();
        h.transport.repeat_status(401, "");

        for _ in 0..2 {
            let result = h.client.send(Method::Post, "/auth/token", None, &[]).await;
            assert!(matches!(result, Err(ClientError::Auth)));
        }

        assert_eq!(h.navigator.visits().len(), 2);
        assert_eq!(h.notifier.notices().len(), 2);
    }

    /// Logs in again while the request is in flight, then rejects it.
    struct ReloginMidFlight {
        session: Arc<SessionStore>,
    }

    #[async_trait::async_trait]
    impl Transport for ReloginMidFlight {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> std::result::Result<HttpResponse, TransportError> {
            self.session
                .login("alice", SecretString::from("tok-2"))
                .expect("login");
            Ok(HttpResponse {
                status: 401,
                body: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_stale_unauthorized_keeps_newer_session() {
        let h = harness();
        login(&h);
        let client = RequestClient::new(
            h.client.base_url().clone(),
            Arc::new(ReloginMidFlight {
                session: h.session.clone(),
            }),
            h.session.clone(),
            h.notifier.clone(),
            h.navigator.clone(),
            "/login",
        );

        let result = client.send(Method::Get, "/orders/me", None, &[]).await;

        assert!(matches!(result, Err(ClientError::Auth)));
        assert!(h.session.is_logged_in());
        assert!(h.navigator.visits().is_empty());
        assert!(h.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_business_error_uses_server_message() {
        let h = harness();
        login(&h);
        h.transport.push_error_envelope(409, "Dish sold out");

        let err = h
            .client
            .send(Method::Post, "/orders/", Some(&json!({})), &[])
            .await
            .expect_err("409");

        match err {
            ClientError::Business { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Dish sold out");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(h.session.is_logged_in());
        assert_eq!(h.notifier.messages(), vec!["Dish sold out".to_string()]);
        assert!(h.navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn test_business_error_without_message_is_generic() {
        let h = harness();
        h.transport.push_status(403, "<html>Forbidden</html>");

        let err = h
            .client
            .send(Method::Get, "/users/", None, &[])
            .await
            .expect_err("403");

        assert!(matches!(
            err,
            ClientError::Business { status: 403, ref message } if message == REQUEST_FAILED_MESSAGE
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_network_error() {
        let h = harness();
        login(&h);
        h.transport.push_error_envelope(500, "Database exploded");

        let err = h
            .client
            .send(Method::Get, "/dishes/", None, &[])
            .await
            .expect_err("500");

        assert!(matches!(err, ClientError::Network(_)));
        assert!(h.session.is_logged_in());
        assert_eq!(h.notifier.messages(), vec![NETWORK_ERROR_MESSAGE.to_string()]);
        assert_eq!(h.transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let h = harness();
        h.transport.push_failure(TransportError::Timeout);

        let err = h
            .client
            .send(Method::Get, "/dishes/", None, &[])
            .await
            .expect_err("timeout");

        assert!(matches!(err, ClientError::Network(_)));
        assert_eq!(h.notifier.messages(), vec![NETWORK_ERROR_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn test_unexpected_data_shape_is_decode_error() {
        let h = harness();
        h.transport.push_ok(json!({"not": "a list"}));

        let err = h
            .client
            .get::<Vec<Value>>("/dishes/", &[])
            .await
            .expect_err("decode");

        assert!(matches!(err, ClientError::Decode(_)));
        assert_eq!(h.notifier.messages(), vec![REQUEST_FAILED_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn test_missing_data_decodes_as_option() {
        let h = harness();
        h.transport
            .push_json(200, &json!({"status": "success", "error_code": 0, "message": "Deleted"}));

        let data: Option<Value> = h.client.delete("/orders/1").await.expect("delete");
        assert!(data.is_none());
    }

    #[test]
    fn test_server_message_extraction() {
        assert_eq!(
            server_message(r#"{"message":"Out of stock"}"#),
            Some("Out of stock".to_string())
        );
        assert_eq!(server_message(r#"{"message":"  "}"#), None);
        assert_eq!(server_message("not json"), None);
    }
}
