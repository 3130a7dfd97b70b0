//! Response building.
//!
//! # Responsibilities
//! - Wrap handler bodies as JSON responses
//! - Map bridge failures to 408 / 500
//! - Define the permissive CORS header set applied to every response

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::any::Any;

use crate::bridge::RequestId;
use crate::error::BridgeError;

/// Header carrying the correlation id on bridged responses.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// CORS headers attached to every response.
pub const CORS_HEADERS: [(HeaderName, &str); 5] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (
        header::ACCESS_CONTROL_ALLOW_METHODS,
        "GET, POST, PUT, PATCH, DELETE, OPTIONS",
    ),
    (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        "Origin, Content-Type, Accept, Authorization",
    ),
    (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"),
    (header::ACCESS_CONTROL_MAX_AGE, "3600"),
];

/// A JSON response with the given status and raw body.
pub fn json(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response()
}

/// 200 with the handler's body.
pub fn delivered(id: RequestId, body: String) -> Response {
    with_request_id(json(StatusCode::OK, body), id)
}

/// 408 naming the request that timed out.
pub fn timed_out(id: RequestId) -> Response {
    let body = serde_json::json!({
        "error": "Request timeout",
        "requestId": id.to_string(),
    });
    with_request_id(json(StatusCode::REQUEST_TIMEOUT, body.to_string()), id)
}

/// 500 for anything that went wrong before the handler could be asked.
pub fn server_error() -> Response {
    let body = serde_json::json!({ "error": "Server error" });
    json(StatusCode::INTERNAL_SERVER_ERROR, body.to_string())
}

/// 204 for CORS preflight.
pub fn preflight() -> Response {
    (StatusCode::NO_CONTENT, Body::empty()).into_response()
}

/// Response used when request handling panics.
pub fn panic_response(_err: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Request handler panicked");
    server_error()
}

fn with_request_id(mut response: Response, id: RequestId) -> Response {
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        match self {
            BridgeError::Timeout(id) => timed_out(id),
            other => {
                tracing::error!(error = %other, "Request failed before reaching the handler");
                server_error()
            }
        }
    }
}
