//! Request extraction.
//!
//! # Responsibilities
//! - Turn an axum request into the bridge's `InboundRequest`
//! - Read the body only for methods that carry one, within the size limit
//! - Flatten headers and query parameters into string maps
//!
//! # Design Decisions
//! - Header names are lower-cased (the `http` crate already normalizes them)
//! - Repeated headers are joined with ", "; later query duplicates win
//! - Empty or non-UTF-8 bodies are reported as absent

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request},
};
use std::collections::BTreeMap;

use crate::bridge::InboundRequest;

/// Failure while reading an inbound request.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to read request body: {0}")]
    Body(#[from] axum::Error),
}

/// Methods whose body is forwarded to the handler.
pub fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Extract method, path, headers, query and body.
pub async fn extract_request(
    request: Request<Body>,
    max_body_bytes: usize,
) -> Result<InboundRequest, ExtractError> {
    let (parts, body) = request.into_parts();

    let body = if carries_body(&parts.method) {
        let bytes = axum::body::to_bytes(body, max_body_bytes).await?;
        String::from_utf8(bytes.to_vec())
            .ok()
            .filter(|text| !text.is_empty())
    } else {
        None
    };

    Ok(InboundRequest {
        method: parts.method.as_str().to_string(),
        path: parts.uri.path().to_string(),
        body,
        headers: header_map(&parts.headers),
        query: query_map(parts.uri.query()),
    })
}

/// Flatten a header map into lower-cased name → value.
pub fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for name in headers.keys() {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        if !values.is_empty() {
            map.insert(name.as_str().to_ascii_lowercase(), values.join(", "));
        }
    }
    map
}

/// Decode a form-urlencoded query string.
pub fn query_map(query: Option<&str>) -> BTreeMap<String, String> {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[tokio::test]
    async fn get_request_has_no_body() {
        let request = Request::builder()
            .method("GET")
            .uri("/status?verbose=1&name=a%20b")
            .header("X-Custom", "one")
            .body(Body::from("ignored"))
            .unwrap();

        let inbound = extract_request(request, 1024).await.unwrap();
        assert_eq!(inbound.method, "GET");
        assert_eq!(inbound.path, "/status");
        assert_eq!(inbound.body, None);
        assert_eq!(inbound.headers["x-custom"], "one");
        assert_eq!(inbound.query["verbose"], "1");
        assert_eq!(inbound.query["name"], "a b");
    }

    #[tokio::test]
    async fn post_request_keeps_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/items")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\":\"a\"}"))
            .unwrap();

        let inbound = extract_request(request, 1024).await.unwrap();
        assert_eq!(inbound.body.as_deref(), Some("{\"name\":\"a\"}"));
        assert_eq!(inbound.headers["content-type"], "application/json");
        assert!(inbound.query.is_empty());
    }

    #[tokio::test]
    async fn empty_body_is_absent() {
        let request = Request::builder()
            .method("PUT")
            .uri("/items/1")
            .body(Body::empty())
            .unwrap();

        let inbound = extract_request(request, 1024).await.unwrap();
        assert_eq!(inbound.body, None);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let request = Request::builder()
            .method("PATCH")
            .uri("/items/1")
            .body(Body::from(vec![b'a'; 64]))
            .unwrap();

        assert!(extract_request(request, 16).await.is_err());
    }

    #[test]
    fn repeated_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append(header::ACCEPT, "text/html".parse().unwrap());
        headers.append(header::ACCEPT, "application/json".parse().unwrap());

        let map = header_map(&headers);
        assert_eq!(map["accept"], "text/html, application/json");
    }

    #[test]
    fn later_query_duplicates_win() {
        let map = query_map(Some("a=1&a=2&b"));
        assert_eq!(map["a"], "2");
        assert_eq!(map["b"], "");
        assert!(query_map(None).is_empty());
    }

    #[test]
    fn body_methods() {
        assert!(carries_body(&Method::POST));
        assert!(carries_body(&Method::PUT));
        assert!(carries_body(&Method::PATCH));
        assert!(!carries_body(&Method::GET));
        assert!(!carries_body(&Method::DELETE));
    }
}
