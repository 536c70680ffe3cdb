use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use crate::errors::{Error, TransportError};
use crate::io::Transport;

/// A request received by the [`MockTransport`].
#[derive(Clone, Debug)]
pub struct MockRequest {
    pub method: &'static str,
    pub url: String,
    pub body: Option<String>,
    /// When the request was issued (tokio clock, so it follows paused time in tests).
    pub at: Instant,
}

/// Mock implementation of [`Transport`].
///
/// GET requests answer the next scripted response if any, the current `status` body otherwise.
/// POST requests always succeed unless the transport is set failing. Every request is recorded.
#[derive(Clone, Debug)]
pub struct MockTransport {
    pub status: Arc<RwLock<String>>,
    pub failing: Arc<AtomicBool>,
    /// Scripted GET responses: `None` stands for a failed request.
    pub scripted: Arc<Mutex<VecDeque<Option<String>>>>,
    pub requests: Arc<Mutex<Vec<MockRequest>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            status: Arc::new(RwLock::new(String::from("0\n"))),
            failing: Arc::new(AtomicBool::new(false)),
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockTransport {
    /// Sets the body answered by GET requests once scripted responses are exhausted.
    pub fn set_status<S: Into<String>>(&self, body: S) {
        *self.status.write() = body.into();
    }

    /// Makes every following request fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Queues a GET response body.
    pub fn script_status<S: Into<String>>(&self, body: S) -> &Self {
        self.scripted.lock().push_back(Some(body.into()));
        self
    }

    /// Queues a failing GET response.
    pub fn script_failure(&self) -> &Self {
        self.scripted.lock().push_back(None);
        self
    }

    /// All requests received so far.
    pub fn get_requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    /// All requests received so far for the given method.
    pub fn get_requests_for(&self, method: &str) -> Vec<MockRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.method == method)
            .cloned()
            .collect()
    }

    fn record(&self, method: &'static str, url: &str, body: Option<String>) {
        self.requests.lock().push(MockRequest {
            method,
            url: url.to_string(),
            body,
            at: Instant::now(),
        });
    }

    fn failure(method: &'static str, url: &str) -> Error {
        Error::from(TransportError::RequestFailed {
            method,
            url: url.to_string(),
            info: String::from("mocked failure"),
        })
    }
}

impl Display for MockTransport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [status={:?}, failing={}]",
            self.get_transport_name(),
            self.status.read(),
            self.failing.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<String, Error> {
        self.record("GET", url, None);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Self::failure("GET", url));
        }
        let scripted = self.scripted.lock().pop_front();
        match scripted {
            Some(Some(body)) => Ok(body),
            Some(None) => Err(Self::failure("GET", url)),
            None => Ok(self.status.read().clone()),
        }
    }

    async fn post(&self, url: &str, body: String) -> Result<String, Error> {
        self.record("POST", url, Some(body));
        match self.failing.load(Ordering::SeqCst) {
            true => Err(Self::failure("POST", url)),
            false => Ok(String::new()),
        }
    }
}
