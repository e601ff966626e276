//! HTTP route handlers for the try-on server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Health check
//! GET  /packs                           - Credit pack listing
//!
//! # JSON API (rate limited)
//! POST /api/v1/create-checkout-session  - Stripe checkout for a credit pack
//! POST /api/v1/generate-tryon           - Virtual try-on generation
//!
//! # Frontend
//! GET  /                                - index.html
//! GET  /{filename}                      - Static file from the bundle
//! ```

pub mod checkout;
pub mod static_files;
pub mod tryon;

use std::time::Duration;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, CONTENT_TYPE},
    },
    middleware::{from_fn, map_response},
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{
    REQUEST_ID_HEADER, api_rate_limiter, rate_limited_json, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Create the JSON API router, mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/create-checkout-session",
            post(checkout::create_checkout_session),
        )
        .route("/generate-tryon", post(tryon::generate_tryon))
        .layer(api_rate_limiter())
        .layer(map_response(rate_limited_json))
}

/// Create all routes without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/packs", get(checkout::list_packs))
        .nest("/api/v1", api_routes())
        .route("/", get(static_files::index))
        .route("/{filename}", get(static_files::file))
}

/// Build the full application with its middleware stack.
///
/// Sentry layers are added by the binary, outside this stack.
pub fn app(state: AppState, cors_allowed_origins: &[String]) -> Router {
    routes()
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(build_cors_layer(cors_allowed_origins))
        .with_state(state)
}

/// Build the CORS layer.
///
/// An empty origin list allows any origin, without credentials. Invalid
/// origins are skipped with a warning.
pub fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(%origin, error = %e, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT])
        .expose_headers([axum::http::HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(3600))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check vendors.
async fn health() -> &'static str {
    "ok"
}
