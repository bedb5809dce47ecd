//! The transport seam.
//!
//! The client never speaks HTTP itself. Callers supply a [`Transport`] that
//! performs one request and returns the raw body; [`MockTransport`] replays
//! canned bodies for tests and demos.

use std::collections::VecDeque;
use std::sync::Mutex;

use thiserror::Error;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a request carries besides its URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Query string, without the leading `?`. May be empty.
    Query(String),
    /// JSON body.
    Json(serde_json::Value),
}

/// A failed request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("url[{url}] error[{message}]")]
pub struct TransportError {
    pub url: String,
    pub message: String,
}

impl TransportError {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Performs one request and returns the raw response body.
///
/// `url` is the service base URL joined with the request path and never
/// carries a query string. For [`Payload::Query`] the transport appends
/// `?{query}` itself when the query is non-empty. Any non-success outcome is
/// an error; the client does not retry.
pub trait Transport: Send + Sync {
    fn execute(&self, method: Method, url: &str, payload: &Payload)
        -> Result<String, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(
        &self,
        method: Method,
        url: &str,
        payload: &Payload,
    ) -> Result<String, TransportError> {
        (**self).execute(method, url, payload)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(
        &self,
        method: Method,
        url: &str,
        payload: &Payload,
    ) -> Result<String, TransportError> {
        (**self).execute(method, url, payload)
    }
}

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub payload: Payload,
}

impl RecordedCall {
    /// The URL an HTTP transport would request: `url`, plus `?{query}` for
    /// a non-empty query payload.
    pub fn target(&self) -> String {
        match &self.payload {
            Payload::Query(query) if !query.is_empty() => format!("{}?{}", self.url, query),
            _ => self.url.clone(),
        }
    }
}

/// Records requests and answers them from a queue.
///
/// When the queue is empty every request answers `{"data": []}`.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    /// Queues a response body.
    pub fn respond(&self, body: impl Into<String>) -> &Self {
        self.queue(Ok(body.into()));
        self
    }

    /// Queues a failure.
    pub fn fail(&self, message: impl Into<String>) -> &Self {
        self.queue(Err(message.into()));
        self
    }

    /// Every request made so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The most recent request.
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls().pop()
    }

    fn queue(&self, response: Result<String, String>) {
        match self.responses.lock() {
            Ok(mut queue) => queue.push_back(response),
            Err(poisoned) => poisoned.into_inner().push_back(response),
        }
    }
}

impl Transport for MockTransport {
    fn execute(
        &self,
        method: Method,
        url: &str,
        payload: &Payload,
    ) -> Result<String, TransportError> {
        tracing::debug!(%method, %url, "mock request");
        let call = RecordedCall {
            method,
            url: url.to_string(),
            payload: payload.clone(),
        };
        match self.calls.lock() {
            Ok(mut calls) => calls.push(call),
            Err(poisoned) => poisoned.into_inner().push(call),
        }

        let next = match self.responses.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        match next {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(TransportError::new(url, message)),
            None => Ok(r#"{"data":[]}"#.to_string()),
        }
    }
}
