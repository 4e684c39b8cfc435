//! Axum router wiring.
//!
//! Layers, innermost first: request tracking, security headers, CORS,
//! HTTP tracing.

use axum::{
    http::{header, HeaderName, HeaderValue},
    middleware,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::{app_state::AppState, error, obs, ops};

/// Every routed path. Request metrics use it to label series.
pub const ROUTES: [&str; 8] = [
    "/",
    "/health",
    "/ready",
    "/info",
    "/api/info",
    "/api/status",
    "/api/version",
    "/metrics",
];

/// Response headers added unless a handler already set them.
fn security_headers() -> [(HeaderName, HeaderValue); 9] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::X_DNS_PREFETCH_CONTROL, HeaderValue::from_static("off")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ),
        (HeaderName::from_static("cross-origin-opener-policy"), HeaderValue::from_static("same-origin")),
        (HeaderName::from_static("cross-origin-resource-policy"), HeaderValue::from_static("same-origin")),
        (HeaderName::from_static("x-download-options"), HeaderValue::from_static("noopen")),
        (HeaderName::from_static("x-permitted-cross-domain-policies"), HeaderValue::from_static("none")),
    ]
}

pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(ops::root))
        .route("/health", get(ops::health))
        .route("/ready", get(ops::ready))
        .route("/info", get(ops::info))
        .route("/api/info", get(ops::info))
        .route("/api/status", get(ops::api_status))
        .route("/api/version", get(ops::api_version))
        .route("/metrics", get(ops::metrics))
        .fallback(error::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), obs::track::track_requests));

    for (name, value) in security_headers() {
        app = app.layer(SetResponseHeaderLayer::if_not_present(name, value));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
