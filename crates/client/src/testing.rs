//! Test doubles for the host-facing seams.
//!
//! Enabled for this crate's own tests and, through the `test-util` feature,
//! for downstream test suites.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::guard::Navigator;
use crate::notice::{Notice, Notifier};
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// Transport that replays queued responses in order and records every
/// request it receives.
///
/// Each call yields to the runtime once before answering, so requests
/// started together are all in flight before any of them completes.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    repeat: Mutex<Option<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response.
    pub fn push_status(&self, status: u16, body: &str) -> &Self {
        self.queue(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }))
    }

    /// Queue a JSON response.
    pub fn push_json(&self, status: u16, body: &Value) -> &Self {
        self.push_status(status, &body.to_string())
    }

    /// Queue a success envelope wrapping `data`.
    pub fn push_ok(&self, data: Value) -> &Self {
        self.push_json(
            200,
            &json!({ "status": "success", "error_code": 0, "message": "OK", "data": data }),
        )
    }

    /// Queue an error envelope with `message`.
    pub fn push_error_envelope(&self, status: u16, message: &str) -> &Self {
        self.push_json(
            status,
            &json!({ "status": "error", "error_code": status, "message": message }),
        )
    }

    /// Queue a transport failure.
    pub fn push_failure(&self, error: TransportError) -> &Self {
        self.queue(Err(error))
    }

    /// Answer every request not covered by the queue with this response.
    pub fn repeat_status(&self, status: u16, body: &str) -> &Self {
        *self.repeat.lock().unwrap_or_else(PoisonError::into_inner) = Some(HttpResponse {
            status,
            body: body.to_string(),
        });
        self
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn queue(&self, response: Result<HttpResponse, TransportError>) -> &Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
        self
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        tokio::task::yield_now().await;

        let next = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(response) => response,
            None => self
                .repeat
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
                .ok_or_else(|| TransportError::Other("no scripted response left".to_string())),
        }
    }
}

/// Notifier that keeps every notice.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages of every notice, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.message).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

/// Navigator that keeps every redirect.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn visits(&self) -> Vec<String> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
    }
}
