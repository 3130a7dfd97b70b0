//! Request events delivered to the external handler.
//!
//! The channel has exactly one consumer: whoever owns [`RequestEvents`].
//! Events are fire-and-forget; the bridge never waits for the consumer to
//! read them, only for the matching `send_response` call.

use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::mpsc;

use crate::bridge::RequestId;

/// An HTTP request as extracted by the adapter, before it has an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundRequest {
    pub method: String,
    pub path: String,
    pub body: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
}

impl InboundRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

/// Immutable snapshot of one inbound request, handed to the external handler.
///
/// Serializes as `{requestId, method, path, body?, headers?, query?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    pub request_id: RequestId,
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
}

impl RequestDescriptor {
    pub(crate) fn new(request_id: RequestId, request: InboundRequest) -> Self {
        Self {
            request_id,
            method: request.method,
            path: request.path,
            body: request.body,
            headers: request.headers,
            query: request.query,
        }
    }

    /// Render the event payload as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Receiving end of the request event channel.
#[derive(Debug)]
pub struct RequestEvents {
    rx: mpsc::UnboundedReceiver<RequestDescriptor>,
}

impl RequestEvents {
    /// Wait for the next request. Returns `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<RequestDescriptor> {
        self.rx.recv().await
    }

    /// Take a request if one is already queued.
    pub fn try_recv(&mut self) -> Option<RequestDescriptor> {
        self.rx.try_recv().ok()
    }
}

/// Create the event channel.
pub fn channel() -> (mpsc::UnboundedSender<RequestDescriptor>, RequestEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, RequestEvents { rx })
}
