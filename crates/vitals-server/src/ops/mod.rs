//! Operational HTTP endpoints.
//!
//! - `/`            : service banner
//! - `/health`      : liveness
//! - `/ready`       : readiness (`degraded` while draining, still 200)
//! - `/info`        : runtime and build facts (`/api/info` alias)
//! - `/api/status`  : service status
//! - `/api/version` : version and build identifiers
//! - `/metrics`     : Prometheus text format
//!
//! Every handler answers 200; host query failures show up as sentinels in
//! the body, never as an error status.

pub mod views;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use vitals_core::exposition::CONTENT_TYPE;
use vitals_core::snapshot::format_timestamp;
use vitals_core::StatusKind;

use crate::app_state::AppState;
use views::{HealthBody, InfoBody, ReadyBody, RootBody, StatusBody, VersionBody};

pub async fn root(State(state): State<AppState>) -> Json<RootBody> {
    let reporter = state.reporter();
    let id = reporter.identity();
    Json(RootBody {
        message: state.cfg().service.message.clone(),
        version: id.version.clone(),
        timestamp: format_timestamp(&reporter.now()),
        environment: id.environment.clone(),
        build: id.build.commit.clone(),
        platform: id.platform.clone(),
        region: id.region.clone(),
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    let snap = state.reporter().snapshot(StatusKind::Health);
    Json(HealthBody::from(snap))
}

pub async fn ready(State(state): State<AppState>) -> Json<ReadyBody> {
    let snap = state.reporter().snapshot(StatusKind::Ready);
    Json(ReadyBody::from(snap))
}

pub async fn info(State(state): State<AppState>) -> Json<InfoBody> {
    let snap = state.reporter().snapshot(StatusKind::Info);
    Json(InfoBody::from(snap))
}

pub async fn api_status(State(state): State<AppState>) -> Json<StatusBody> {
    let reporter = state.reporter();
    let id = reporter.identity();
    Json(StatusBody {
        service: id.service.clone(),
        status: "running",
        version: id.version.clone(),
        environment: id.environment.clone(),
        timestamp: format_timestamp(&reporter.now()),
        platform: id.platform.clone(),
        region: id.region.clone(),
    })
}

pub async fn api_version(State(state): State<AppState>) -> Json<VersionBody> {
    let id = state.reporter().identity();
    Json(VersionBody {
        version: id.version.clone(),
        build: id.build.build_number.clone(),
        commit: id.build.commit.clone(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let extra = state.metrics_extra();
    let body = state.reporter().render_metrics(&extra);

    (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response()
}
