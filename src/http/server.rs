//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the bridging handler
//! - Wire up middleware (tracing, CORS headers, panic recovery)
//! - Answer CORS preflight directly
//! - Hand every other request to the correlation bridge and wait for its answer
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::bridge::CorrelationBridge;
use crate::config::ServerConfig;
use crate::error::BridgeError;
use crate::http::request::extract_request;
use crate::http::response::{self, CORS_HEADERS};
use crate::lifecycle::ShutdownListener;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<CorrelationBridge>,
    pub response_timeout: Duration,
    pub max_body_bytes: usize,
}

/// HTTP front end of the correlation bridge.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server answering through `bridge`.
    pub fn new(bridge: Arc<CorrelationBridge>, config: &ServerConfig) -> Self {
        let state = AppState {
            response_timeout: bridge.default_timeout(),
            bridge,
            max_body_bytes: config.limits.max_body_bytes,
        };
        Self {
            router: build_router(state),
        }
    }

    /// Run the server until `shutdown` fires, then drain open connections.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownListener,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/", any(bridge_handler))
        .route("/{*path}", any(bridge_handler))
        .with_state(state);

    with_middleware(router)
}

/// Panic recovery, CORS headers and request tracing, outermost last.
fn with_middleware(router: Router) -> Router {
    let mut router = router.layer(CatchPanicLayer::custom(response::panic_response));

    for (name, value) in CORS_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            name,
            HeaderValue::from_static(value),
        ));
    }

    router.layer(TraceLayer::new_for_http())
}

/// Main handler: preflight or bridge.
async fn bridge_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();

    let response = if method == Method::OPTIONS {
        response::preflight()
    } else {
        match forward(&state, request).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}

/// Hand the request to the external handler and wait for its answer.
async fn forward(state: &AppState, request: Request<Body>) -> Result<Response, BridgeError> {
    let inbound = match extract_request(request, state.max_body_bytes).await {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request");
            return Ok(response::server_error());
        }
    };

    let pending = state.bridge.begin_request(inbound)?;
    let request_id = pending.id();

    let body = state
        .bridge
        .await_response(pending, state.response_timeout)
        .await
        .into_result(request_id)?;

    Ok(response::delivered(request_id, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::events::{self, RequestEvents};
    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    fn state(timeout: Duration) -> (AppState, RequestEvents) {
        let (tx, events) = events::channel();
        let state = AppState {
            bridge: Arc::new(CorrelationBridge::new(tx, timeout)),
            response_timeout: timeout,
            max_body_bytes: 1024,
        };
        (state, events)
    }

    fn answer_with<F>(bridge: Arc<CorrelationBridge>, mut events: RequestEvents, f: F)
    where
        F: Fn(&crate::bridge::RequestDescriptor) -> String + Send + 'static,
    {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let _ = bridge.resolve(&event.request_id.to_string(), f(&event));
            }
        });
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn assert_cors(response: &Response) {
        for (name, value) in CORS_HEADERS {
            assert_eq!(response.headers()[name], value);
        }
    }

    #[tokio::test]
    async fn options_is_answered_without_bridge() {
        let (state, mut events) = state(Duration::from_secs(5));
        let bridge = Arc::clone(&state.bridge);
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_cors(&response);
        assert!(body_string(response).await.is_empty());
        assert!(events.try_recv().is_none());
        assert_eq!(bridge.stats().total_registered.load(std::sync::atomic::Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn get_is_answered_by_handler() {
        let (state, events) = state(Duration::from_secs(5));
        answer_with(Arc::clone(&state.bridge), events, |event| {
            assert_eq!(event.method, "GET");
            assert_eq!(event.path, "/status");
            "{\"ok\":true}".to_string()
        });
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert!(response.headers().contains_key(response::X_REQUEST_ID));
        assert_cors(&response);
        assert_eq!(body_string(response).await, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn post_body_reaches_handler() {
        let (state, events) = state(Duration::from_secs(5));
        answer_with(Arc::clone(&state.bridge), events, |event| {
            event.body.clone().unwrap_or_default()
        });
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/echo?x=1")
                    .body(Body::from("{\"n\":1}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "{\"n\":1}");
    }

    #[tokio::test]
    async fn silent_handler_yields_408() {
        let (state, mut events) = state(Duration::from_millis(100));
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_cors(&response);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "Request timeout");
        assert_eq!(body["requestId"], event.request_id.to_string());
    }

    #[tokio::test]
    async fn missing_handler_yields_500() {
        let (state, events) = state(Duration::from_secs(5));
        drop(events);
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        assert_eq!(body_string(response).await, "{\"error\":\"Server error\"}");
    }

    #[tokio::test]
    async fn oversized_body_yields_500() {
        let (state, mut events) = state(Duration::from_secs(5));
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .body(Body::from(vec![b'x'; 4096]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(events.try_recv().is_none());
    }

    #[tokio::test]
    async fn panic_is_caught_and_keeps_cors() {
        async fn boom() -> &'static str {
            panic!("handler failure")
        }
        let app = with_middleware(Router::new().route("/boom", axum::routing::get(boom)));

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        assert_eq!(body_string(response).await, "{\"error\":\"Server error\"}");
    }
}
