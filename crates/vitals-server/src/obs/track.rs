//! Request tracking middleware.
//!
//! Runs outside routing, so the route label is resolved against the static
//! route table instead of `MatchedPath`. Anything not in the table collapses
//! into one `unmatched` label to keep series cardinality bounded.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app_state::AppState;
use crate::obs::metrics::GaugeVec;
use crate::router::ROUTES;

pub const UNMATCHED: &str = "unmatched";

pub fn route_label(path: &str) -> &'static str {
    ROUTES.iter().copied().find(|r| *r == path).unwrap_or(UNMATCHED)
}

/// Holds one in-flight slot; released on drop so a cancelled request
/// (client gone, outer timeout) does not leak the gauge.
struct InFlight<'a> {
    gauge: &'a GaugeVec,
    route: &'static str,
}

impl<'a> InFlight<'a> {
    fn enter(gauge: &'a GaugeVec, route: &'static str) -> Self {
        gauge.inc(&[("route", route)]);
        Self { gauge, route }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.gauge.dec(&[("route", self.route)]);
    }
}

pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().as_str().to_owned();
    let route = route_label(req.uri().path());
    let metrics = state.request_metrics();

    let slot = InFlight::enter(&metrics.in_flight, route);
    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed();
    drop(slot);

    let status = response.status().as_u16().to_string();
    metrics
        .requests
        .inc(&[("method", method.as_str()), ("route", route), ("status", status.as_str())]);
    metrics.duration.observe(&[("method", method.as_str()), ("route", route)], elapsed);

    let latency_us = elapsed.as_micros() as u64;
    tracing::debug!(%method, route, %status, latency_us, "request served");
    response
}
